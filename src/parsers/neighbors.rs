use regex_lite::Regex;

use super::pattern;
use crate::models::{DeviceFamily, FieldValue, Record};

/// Line-driven parser for "detail" neighbor listings: a `start` line opens a new
/// entry, every other rule fills the current entry's fields once.
struct TableParser {
    start: Rule,
    rules: Vec<Rule>,
}

struct Rule {
    re: Option<Regex>,
    fields: &'static [&'static str],
}

impl Rule {
    fn new(re: &str, fields: &'static [&'static str]) -> Self {
        Self {
            re: pattern(re),
            fields,
        }
    }

    /// Apply to `line`, writing captures into `record` for fields not yet set.
    /// Returns whether the rule matched.
    fn apply(&self, line: &str, record: &mut Record) -> bool {
        let Some(caps) = self.re.as_ref().and_then(|re| re.captures(line)) else {
            return false;
        };
        for (i, field) in self.fields.iter().enumerate() {
            if record.contains_key(*field) {
                continue;
            }
            if let Some(m) = caps.get(i + 1) {
                let value = m.as_str().trim();
                if !value.is_empty() {
                    record.insert(field.to_string(), FieldValue::Text(value.to_string()));
                }
            }
        }
        true
    }
}

impl TableParser {
    fn parse(&self, raw: &str) -> Vec<Record> {
        let mut records = Vec::new();
        let mut current: Option<Record> = None;

        for line in raw.lines() {
            let line = line.trim_end();

            let mut opened = Record::new();
            if self.start.apply(line, &mut opened) {
                if let Some(done) = current.take() {
                    records.push(done);
                }
                current = Some(opened);
                continue;
            }

            if let Some(record) = current.as_mut() {
                for rule in &self.rules {
                    rule.apply(line, record);
                }
            }
        }

        if let Some(done) = current {
            records.push(done);
        }
        records
    }
}

/// Parse `show cdp neighbors detail`. One layout covers ios, xr and nxos; nxos
/// appends the serial in parentheses to the device id, which is dropped.
pub fn parse_cdp_detail(raw: &str) -> Vec<Record> {
    let parser = TableParser {
        start: Rule::new(r"^\s*Device ID:\s*([^\s(]+)", &["destination_host"]),
        rules: vec![
            Rule::new(r"^\s*(?:IP address|IPv4 [Aa]ddress):\s*(\S+)", &["management_ip"]),
            Rule::new(r"^\s*Platform:\s*([^,]+)", &["platform"]),
            Rule::new(r"^\s*Interface:\s*([^,\s]+)", &["local_interface"]),
            Rule::new(r"Port ID \(outgoing port\):\s*(\S+)", &["remote_interface"]),
        ],
    };
    parser.parse(raw)
}

/// Parse `show lldp neighbors detail`. ios and xr open each entry with the local
/// interface; nxos opens with the chassis id and reports "Local Port id" later.
pub fn parse_lldp_detail(family: DeviceFamily, raw: &str) -> Vec<Record> {
    let common = || {
        vec![
            Rule::new(r"^\s*Port id:\s*(\S+)", &["remote_interface"]),
            Rule::new(r"^\s*System Name:\s*(\S+)", &["neighbor"]),
            Rule::new(r"^\s*(?:IP|Management Address):\s*(\S+)", &["management_ip"]),
        ]
    };

    let parser = match family {
        DeviceFamily::Ios | DeviceFamily::Xr => {
            let mut rules = common();
            rules.push(Rule::new(r"^\s*Chassis id:\s*(\S+)", &["chassis_id"]));
            TableParser {
                start: Rule::new(r"^\s*Local (?:Intf|Interface):\s*(\S+)", &["local_interface"]),
                rules,
            }
        }
        DeviceFamily::Nxos => {
            let mut rules = common();
            rules.push(Rule::new(r"^\s*Local Port id:\s*(\S+)", &["local_interface"]));
            TableParser {
                start: Rule::new(r"^\s*Chassis id:\s*(\S+)", &["chassis_id"]),
                rules,
            }
        }
    };
    parser.parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record_text;

    const IOS_CDP: &str = r#"-------------------------
Device ID: core-sw.example.com
Entry address(es):
  IP address: 10.0.0.2
Platform: cisco WS-C3850-24T,  Capabilities: Router Switch IGMP
Interface: GigabitEthernet0/1,  Port ID (outgoing port): GigabitEthernet0/2
Holdtime : 150 sec

Version :
Cisco IOS Software, IOS-XE Software, Catalyst L3 Switch Software (CAT3K_CAA-UNIVERSALK9-M), Version 16.3.7

-------------------------
Device ID: ap-lobby
Entry address(es):
  IP address: 10.0.0.50
Platform: cisco AIR-AP2802I-B-K9,  Capabilities: Trans-Bridge Source-Route-Bridge IGMP
Interface: GigabitEthernet0/5,  Port ID (outgoing port): GigabitEthernet0

Total cdp entries displayed : 2
"#;

    const NXOS_CDP: &str = r#"----------------------------------------
Device ID:spine1(FDO12345ABC)
System Name: spine1

Interface address(es):
    IPv4 Address: 10.1.1.1
Platform: N9K-C9332C, Capabilities: Router Switch IGMP Filtering Supports-STP-Dispute
Interface: Ethernet1/49, Port ID (outgoing port): Ethernet1/1
Holdtime: 131 sec
"#;

    const XR_CDP: &str = r#"-------------------------
Device ID: pe2
SysName : pe2
Entry address(es):
  IPv4 address: 10.2.2.2
Platform: cisco ASR9K Series,  Capabilities: Router
Interface: GigabitEthernet0/0/0/0
Port ID (outgoing port): GigabitEthernet0/0/0/1
"#;

    const IOS_LLDP: &str = r#"------------------------------------------------
Local Intf: Gi1/0/1
Chassis id: 0011.2233.4455
Port id: Gi0/2
Port Description: GigabitEthernet0/2
System Name: core-sw.example.com

System Description:
Cisco IOS Software, Catalyst L3 Switch Software

Time remaining: 105 seconds
System Capabilities: B,R
Enabled Capabilities: B,R
Management Addresses:
    IP: 10.0.0.2

------------------------------------------------
Local Intf: Gi1/0/2
Chassis id: 0011.2233.6677
Port id: 0011.2233.6677
System Name: - not advertised

Total entries displayed: 2
"#;

    const NXOS_LLDP: &str = r#"Capability codes:
  (R) Router, (B) Bridge, (T) Telephone, (C) DOCSIS Cable Device

Chassis id: 0011.2233.4455
Port id: Ethernet1/1
Local Port id: Eth1/49
Port Description: Ethernet1/1
System Name: spine1.example.com
System Description: Cisco Nexus Operating System (NX-OS) Software 9.3(8)
Management Address: 10.1.1.1

Chassis id: 0011.2233.8899
Port id: Ethernet1/1
Local Port id: Eth1/50
Port Description: Ethernet1/1
System Name: spine2
Management Address: 10.1.1.2

Total entries displayed: 2
"#;

    #[test]
    fn test_ios_cdp_detail() {
        let records = parse_cdp_detail(IOS_CDP);
        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(record_text(first, "destination_host"), Some("core-sw.example.com"));
        assert_eq!(record_text(first, "local_interface"), Some("GigabitEthernet0/1"));
        assert_eq!(record_text(first, "remote_interface"), Some("GigabitEthernet0/2"));
        assert_eq!(record_text(first, "management_ip"), Some("10.0.0.2"));
        assert_eq!(record_text(first, "platform"), Some("cisco WS-C3850-24T"));
        assert_eq!(record_text(&records[1], "remote_interface"), Some("GigabitEthernet0"));
    }

    #[test]
    fn test_nxos_cdp_detail_drops_serial() {
        let records = parse_cdp_detail(NXOS_CDP);
        assert_eq!(records.len(), 1);
        assert_eq!(record_text(&records[0], "destination_host"), Some("spine1"));
        assert_eq!(record_text(&records[0], "local_interface"), Some("Ethernet1/49"));
        assert_eq!(record_text(&records[0], "remote_interface"), Some("Ethernet1/1"));
        assert_eq!(record_text(&records[0], "management_ip"), Some("10.1.1.1"));
    }

    #[test]
    fn test_xr_cdp_detail_split_lines() {
        let records = parse_cdp_detail(XR_CDP);
        assert_eq!(records.len(), 1);
        assert_eq!(record_text(&records[0], "local_interface"), Some("GigabitEthernet0/0/0/0"));
        assert_eq!(record_text(&records[0], "remote_interface"), Some("GigabitEthernet0/0/0/1"));
    }

    #[test]
    fn test_ios_lldp_detail() {
        let records = parse_lldp_detail(DeviceFamily::Ios, IOS_LLDP);
        assert_eq!(records.len(), 2);
        assert_eq!(record_text(&records[0], "local_interface"), Some("Gi1/0/1"));
        assert_eq!(record_text(&records[0], "remote_interface"), Some("Gi0/2"));
        assert_eq!(record_text(&records[0], "neighbor"), Some("core-sw.example.com"));
        assert_eq!(record_text(&records[0], "management_ip"), Some("10.0.0.2"));
        assert_eq!(record_text(&records[1], "chassis_id"), Some("0011.2233.6677"));
    }

    #[test]
    fn test_nxos_lldp_detail() {
        let records = parse_lldp_detail(DeviceFamily::Nxos, NXOS_LLDP);
        assert_eq!(records.len(), 2);
        assert_eq!(record_text(&records[0], "local_interface"), Some("Eth1/49"));
        assert_eq!(record_text(&records[0], "remote_interface"), Some("Ethernet1/1"));
        assert_eq!(record_text(&records[0], "neighbor"), Some("spine1.example.com"));
        assert_eq!(record_text(&records[1], "local_interface"), Some("Eth1/50"));
        assert_eq!(record_text(&records[1], "neighbor"), Some("spine2"));
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_cdp_detail("").is_empty());
        assert!(parse_lldp_detail(DeviceFamily::Nxos, "Total entries displayed: 0\n").is_empty());
    }
}
