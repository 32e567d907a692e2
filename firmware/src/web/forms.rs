/// Decoded fields of the config form. `None` means the field was absent
/// from the submission (as opposed to submitted empty).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConfigForm {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub hostname: Option<String>,
}

/// Parse an `application/x-www-form-urlencoded` body:
/// `ssid=MyNet&password=secret&hostname=esp32`. Unknown keys are ignored.
pub fn parse_config_form(body: &str) -> ConfigForm {
    let mut form = ConfigForm::default();
    for part in body.split('&') {
        if let Some((key, value)) = part.split_once('=') {
            let decoded = url_decode(value);
            match key {
                "ssid" => form.ssid = Some(decoded),
                "password" => form.password = Some(decoded),
                "hostname" => form.hostname = Some(decoded),
                _ => {}
            }
        }
    }
    form
}

/// Minimal URL percent-decoding for form values. Escapes decode to raw
/// bytes first so multibyte UTF-8 sequences come through intact.
pub fn url_decode(s: &str) -> String {
    let mut decoded = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => decoded.push(b' '),
            b'%' => {
                let h1 = bytes.next().and_then(hex_digit);
                let h2 = bytes.next().and_then(hex_digit);
                if let (Some(h1), Some(h2)) = (h1, h2) {
                    decoded.push(h1 * 16 + h2);
                }
            }
            b => decoded.push(b),
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
