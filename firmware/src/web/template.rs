use std::net::Ipv4Addr;

/// Values substituted into `%NAME%` placeholders at render time.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub sta_ip: Option<Ipv4Addr>,
    pub ap_ip: Option<Ipv4Addr>,
    pub ssid: String,
    pub password: String,
    pub hostname: String,
    pub green_led: bool,
    pub red_led: bool,
}

impl PageContext {
    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "IP" => Some(self.sta_ip.map(|ip| ip.to_string()).unwrap_or_default()),
            "APIP" => Some(self.ap_ip.map(|ip| ip.to_string()).unwrap_or_default()),
            "SSID" => Some(self.ssid.clone()),
            "PASSWORD" => Some(self.password.clone()),
            "HOSTNAME" => Some(self.hostname.clone()),
            "GREEN_LED_STATE" => Some(led_state(self.green_led)),
            "RED_LED_STATE" => Some(led_state(self.red_led)),
            _ => None,
        }
    }
}

fn led_state(on: bool) -> String {
    if on { "1" } else { "0" }.to_string()
}

/// Substitute recognized `%NAME%` placeholders; everything else, including
/// unknown placeholder names and stray percent signs, passes through
/// unchanged.
pub fn render(template: &str, ctx: &PageContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('%') else {
            out.push('%');
            rest = after;
            continue;
        };
        let name = &after[..end];
        let is_token =
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_token {
            match ctx.lookup(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('%');
                    out.push_str(name);
                    out.push('%');
                }
            }
            rest = &after[end + 1..];
        } else {
            // not a placeholder; re-scan from just past this percent sign
            out.push('%');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PageContext {
        PageContext {
            sta_ip: Some(Ipv4Addr::new(192, 168, 1, 50)),
            ap_ip: Some(Ipv4Addr::new(8, 8, 8, 8)),
            ssid: "home-net".into(),
            password: "secret99".into(),
            hostname: "esp32".into(),
            green_led: true,
            red_led: false,
        }
    }

    #[test]
    fn substitutes_all_known_placeholders() {
        let page = "%IP% %APIP% %SSID% %PASSWORD% %HOSTNAME% %GREEN_LED_STATE% %RED_LED_STATE%";
        assert_eq!(
            render(page, &ctx()),
            "192.168.1.50 8.8.8.8 home-net secret99 esp32 1 0"
        );
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        assert_eq!(render("a %NOPE% b", &ctx()), "a %NOPE% b");
    }

    #[test]
    fn stray_percent_signs_survive() {
        assert_eq!(render("100% done", &ctx()), "100% done");
        assert_eq!(render("100% of %SSID%", &ctx()), "100% of home-net");
        assert_eq!(render("trailing %", &ctx()), "trailing %");
    }

    #[test]
    fn missing_station_ip_renders_empty() {
        let mut c = ctx();
        c.sta_ip = None;
        assert_eq!(render("[%IP%]", &c), "[]");
    }

    #[test]
    fn plain_text_is_untouched() {
        let page = "<html><body>hello</body></html>";
        assert_eq!(render(page, &ctx()), page);
    }
}
