use super::{capture_all, capture_first};
use crate::models::{DeviceFamily, FieldValue, Record};

/// Parse `show version`. Returns a single record, or nothing when the output
/// carries neither a version nor a hostname.
pub fn parse_show_version(family: DeviceFamily, raw: &str) -> Vec<Record> {
    let record = match family {
        DeviceFamily::Ios => parse_ios(raw),
        DeviceFamily::Xr => parse_xr(raw),
        DeviceFamily::Nxos => parse_nxos(raw),
    };
    if record.is_empty() {
        Vec::new()
    } else {
        vec![record]
    }
}

fn insert_text(record: &mut Record, field: &str, value: Option<String>) {
    if let Some(value) = value {
        record.insert(field.to_string(), FieldValue::Text(value));
    }
}

fn insert_list(record: &mut Record, field: &str, values: Vec<String>) {
    if !values.is_empty() {
        record.insert(field.to_string(), FieldValue::List(values));
    }
}

/// Hostname from the "<name> uptime is" line; "System uptime is" is not a name
fn uptime_hostname(raw: &str) -> Option<String> {
    capture_all(r"(?m)^\s*(\S+)\s+uptime is", raw)
        .into_iter()
        .find(|name| !name.eq_ignore_ascii_case("system"))
}

fn parse_ios(raw: &str) -> Record {
    let mut record = Record::new();

    let version = capture_first(r"(?m)^.*Cisco IOS.*?Version\s+([^,\s]+)", raw);
    if version.is_none() {
        return record;
    }
    insert_text(&mut record, "version", version);
    insert_text(&mut record, "hostname", uptime_hostname(raw));
    insert_text(
        &mut record,
        "running_image",
        capture_first(r#"(?m)^System image file is "([^"]+)""#, raw),
    );

    // Stacks list one "Model number" per member; chassis without it only have
    // the processor line.
    let mut hardware = capture_all(r"(?m)^\s*Model [Nn]umber\s*:\s*(\S+)", raw);
    if hardware.is_empty() {
        hardware = capture_all(r"(?m)^[Cc]isco\s+(\S+)\s+\(.*\)\s+processor", raw);
    }
    insert_list(&mut record, "hardware", hardware);

    let mut serial = capture_all(r"(?m)^\s*System [Ss]erial [Nn]umber\s*:\s*(\S+)", raw);
    if serial.is_empty() {
        serial = capture_all(r"(?m)^Processor board ID\s+(\S+)", raw);
    }
    insert_list(&mut record, "serial", serial);

    record
}

fn parse_xr(raw: &str) -> Record {
    let mut record = Record::new();

    let version = capture_first(r"(?m)^.*Cisco IOS XR Software.*?Version\s+([^,\s\[]+)", raw);
    if version.is_none() {
        return record;
    }
    insert_text(&mut record, "version", version);
    insert_text(&mut record, "hostname", uptime_hostname(raw));
    insert_text(
        &mut record,
        "running_image",
        capture_first(r#"(?m)^System image file is "([^"]+)""#, raw),
    );
    insert_list(
        &mut record,
        "hardware",
        capture_all(r"(?m)^\s*cisco\s+(\S+)(?:\s+Series)?\s+\(.*\)\s+processor", raw),
    );
    insert_list(
        &mut record,
        "serial",
        capture_all(r"(?m)^\s*Processor [Bb]oard ID\s+(\S+)", raw),
    );

    record
}

fn parse_nxos(raw: &str) -> Record {
    let mut record = Record::new();

    let os = capture_first(r"(?m)^\s*(?:NXOS|system):\s+version\s+(\S+)", raw);
    let hostname = capture_first(r"(?m)^\s*Device name:\s*(\S+)", raw);
    if os.is_none() && hostname.is_none() {
        return record;
    }
    insert_text(&mut record, "os", os);
    insert_text(&mut record, "hostname", hostname);
    insert_text(
        &mut record,
        "boot_image",
        capture_first(r"(?m)^\s*(?:NXOS|system)\s+image file is:\s*(\S+)", raw),
    );
    insert_text(
        &mut record,
        "platform",
        capture_first(r"(?m)^\s*cisco\s+Nexus\S*\s+(?:.*\s)?(\S+)\s+[Cc]hassis", raw),
    );
    insert_text(
        &mut record,
        "serial_number",
        capture_first(r"(?m)^\s*Processor [Bb]oard ID\s+(\S+)", raw),
    );

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record_text;

    const IOS_STACK: &str = r#"Cisco IOS Software, C2960X Software (C2960X-UNIVERSALK9-M), Version 15.2(7)E2, RELEASE SOFTWARE (fc3)
Technical Support: http://www.cisco.com/techsupport
ROM: Bootstrap program is C2960X boot loader

access-sw1 uptime is 1 year, 2 weeks, 3 days, 4 hours, 5 minutes
System returned to ROM by power-on
System image file is "flash:c2960x-universalk9-mz.152-7.E2/c2960x-universalk9-mz.152-7.E2.bin"

cisco WS-C2960X-48FPD-L (APM86XXX) processor (revision B0) with 524288K bytes of memory.
Processor board ID FOC1111X0AA

Model number                    : WS-X1
System serial number            : FOC1111X0AA

Switch 02
---------
Model number                    : WS-X2
System serial number            : FOC2222X0BB
"#;

    const NXOS: &str = r#"Cisco Nexus Operating System (NX-OS) Software
TAC support: http://www.cisco.com/tac

Software
  BIOS: version 05.39
  NXOS: version 9.3(8)
  BIOS compile time:  08/30/2019
  NXOS image file is: bootflash:///nxos.9.3.8.bin
  NXOS compile time:  8/18/2021 16:00:00 [08/19/2021 00:43:46]

Hardware
  cisco Nexus9000 C93180YC-EX chassis
  Intel(R) Xeon(R) CPU  @ 1.80GHz with 24569356 kB of memory.
  Processor Board ID FDO21120ABC

  Device name: leaf1
  bootflash:   53298520 kB
Kernel uptime is 120 day(s), 3 hour(s), 10 minute(s), 5 second(s)
"#;

    const XR: &str = r#"Cisco IOS XR Software, Version 6.5.3[Default]
Copyright (c) 2013-2019 by Cisco Systems, Inc.

ROM: System Bootstrap, Version 0.76(c) 1994-2012,

pe1 uptime is 3 weeks, 2 days
System image file is "disk0:asr9k-os-mbi-6.5.3/0x100305/mbiasr9k-rsp3.vm"

cisco ASR9K Series (Intel 686 F6M14S4) processor with 12582912K bytes of memory.
"#;

    #[test]
    fn test_ios_stack_lists() {
        let records = parse_show_version(DeviceFamily::Ios, IOS_STACK);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(record_text(r, "hostname"), Some("access-sw1"));
        assert_eq!(record_text(r, "version"), Some("15.2(7)E2"));
        assert_eq!(
            record_text(r, "running_image"),
            Some("flash:c2960x-universalk9-mz.152-7.E2/c2960x-universalk9-mz.152-7.E2.bin")
        );
        assert_eq!(r["hardware"].joined(), "WS-X1,WS-X2");
        assert_eq!(r["serial"].joined(), "FOC1111X0AA,FOC2222X0BB");
    }

    #[test]
    fn test_ios_single_chassis_falls_back_to_processor_line() {
        let raw = "Cisco IOS Software, 3800 Software (C3845-ADVENTERPRISEK9-M), Version 15.1(4)M4, RELEASE SOFTWARE (fc1)\n\
                   rtr1 uptime is 5 weeks\n\
                   cisco 3845 (revision 1.0) processor (revision 3.0) with 1000K bytes of memory.\n\
                   Processor board ID FTX1234A0BC\n";
        let records = parse_show_version(DeviceFamily::Ios, raw);
        let r = &records[0];
        assert_eq!(record_text(r, "hostname"), Some("rtr1"));
        assert_eq!(r["hardware"].joined(), "3845");
        assert_eq!(r["serial"].joined(), "FTX1234A0BC");
        assert!(!r.contains_key("running_image"));
    }

    #[test]
    fn test_nxos_fields() {
        let records = parse_show_version(DeviceFamily::Nxos, NXOS);
        let r = &records[0];
        assert_eq!(record_text(r, "hostname"), Some("leaf1"));
        assert_eq!(record_text(r, "os"), Some("9.3(8)"));
        assert_eq!(record_text(r, "boot_image"), Some("bootflash:///nxos.9.3.8.bin"));
        assert_eq!(record_text(r, "platform"), Some("C93180YC-EX"));
        assert_eq!(record_text(r, "serial_number"), Some("FDO21120ABC"));
    }

    #[test]
    fn test_xr_fields() {
        let records = parse_show_version(DeviceFamily::Xr, XR);
        let r = &records[0];
        assert_eq!(record_text(r, "version"), Some("6.5.3"));
        assert_eq!(record_text(r, "hostname"), Some("pe1"));
        assert_eq!(r["hardware"].joined(), "ASR9K");
    }

    #[test]
    fn test_unrecognised_output_is_empty() {
        assert!(parse_show_version(DeviceFamily::Ios, "garbage\n").is_empty());
        assert!(parse_show_version(DeviceFamily::Nxos, "").is_empty());
    }
}
