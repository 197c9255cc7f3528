use std::sync::OnceLock;

use regex::Regex;

use crate::app::models::DeviceSummary;

pub fn parse_adb_devices(output: &str) -> Vec<DeviceSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let serial = tokens.next()?.to_string();
            let state = tokens.next()?.to_string();
            let mut summary = DeviceSummary {
                serial,
                state,
                model: None,
                product: None,
                device: None,
                transport_id: None,
            };
            for token in tokens {
                let Some((key, value)) = token.split_once(':') else {
                    continue;
                };
                let slot = match key {
                    "model" => &mut summary.model,
                    "product" => &mut summary.product,
                    "device" => &mut summary.device,
                    "transport_id" => &mut summary.transport_id,
                    _ => continue,
                };
                *slot = Some(value.to_string());
            }
            Some(summary)
        })
        .collect()
}

/// Whether the usage text printed by a bare `input` lists the `swipe` verb.
pub fn input_usage_supports_swipe(usage: &str) -> bool {
    static SWIPE: OnceLock<Option<Regex>> = OnceLock::new();
    match SWIPE.get_or_init(|| Regex::new(r"\bswipe\b").ok()) {
        Some(re) => re.is_match(usage),
        None => usage.contains("swipe"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_listing() {
        let output = "* daemon started successfully\nList of devices attached\n\
            0123456789ABCDEF       device usb:1-1 product:panther model:Pixel_7 device:panther transport_id:3\n\
            emulator-5554          offline\n\n";
        let devices = parse_adb_devices(output);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial, "0123456789ABCDEF");
        assert!(devices[0].is_online());
        assert_eq!(devices[0].model.as_deref(), Some("Pixel_7"));
        assert_eq!(devices[0].transport_id.as_deref(), Some("3"));
        assert_eq!(devices[1].state, "offline");
        assert!(!devices[1].is_online());
    }

    #[test]
    fn empty_listing_has_no_devices() {
        assert!(parse_adb_devices("List of devices attached\n\n").is_empty());
    }

    #[test]
    fn detects_swipe_in_input_usage() {
        let usage = "Usage: input [<source>] <command> [<arg>...]\n\n\
            The commands and default sources are:\n\
                  text <string> (Default: touchscreen)\n\
                  keyevent [--longpress] <key code number or name> ... (Default: keyboard)\n\
                  tap <x> <y> (Default: touchscreen)\n\
                  swipe <x1> <y1> <x2> <y2> [duration(ms)] (Default: touchscreen)\n";
        assert!(input_usage_supports_swipe(usage));
    }

    #[test]
    fn detects_swipe_in_legacy_usage() {
        let usage = "usage: input text <string>\n       input tap <x> <y>\n       input swipe <x1> <y1> <x2> <y2>\n";
        assert!(input_usage_supports_swipe(usage));
    }

    #[test]
    fn old_input_usage_without_swipe() {
        let usage = "usage: input text <string>\n       input keyevent <key code>\n       input tap <x> <y>\n";
        assert!(!input_usage_supports_swipe(usage));
        assert!(!input_usage_supports_swipe("/system/bin/sh: input: not found"));
    }
}
