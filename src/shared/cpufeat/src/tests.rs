use super::*;

fn snapshot_with_bit(register: Register, bit: u8) -> LeafSnapshot {
    let mut registers = [0u32; 4];
    registers[register as usize] = 1 << bit;
    LeafSnapshot::from_registers(registers)
}

#[test]
fn bit_decodes_enable_iff_set() {
    for feature in &FEATURES {
        let set = snapshot_with_bit(feature.register, feature.bit);
        assert!(set.bit(feature.register, feature.bit), "{} should decode as set", feature.name);
        assert_eq!(label(set.bit(feature.register, feature.bit)), "enable");

        let clear = LeafSnapshot::zeroed();
        assert!(!clear.bit(feature.register, feature.bit));
        assert_eq!(label(clear.bit(feature.register, feature.bit)), "disable");
    }
}

#[test]
fn bit_decode_ignores_other_registers() {
    // A bit set in EBX must never decode as set in ECX at the same position.
    let snapshot = snapshot_with_bit(Register::Ebx, 3);
    assert!(!snapshot.bit(Register::Ecx, 3));
    assert!(!snapshot.bit(Register::Eax, 3));
    assert!(!snapshot.bit(Register::Edx, 3));
}

#[test]
fn feature_table_report_order() {
    let names: Vec<&str> = FEATURES.iter().map(|feature| feature.name).collect();
    assert_eq!(
        names,
        [
            "SGX",
            "SMEP",
            "INVPCID",
            "MPX",
            "SMAP",
            "CLFLUSHOPT",
            "PREFETCHWT1",
            "PKU",
            "OSPKE",
            "ARAT. APIC-Timer-always-running feature",
            "Invariant TSC",
            "x2APIC",
            "TSC-Deadline",
        ]
    );
}

#[test]
fn feature_table_leaves_are_contiguous() {
    // The reporting loop queries a leaf once when it changes, so every leaf
    // must appear in exactly one contiguous run.
    let mut seen = Vec::new();
    for feature in &FEATURES {
        if seen.last() != Some(&feature.leaf) {
            assert!(!seen.contains(&feature.leaf), "leaf {:#x} split across runs", feature.leaf);
            seen.push(feature.leaf);
        }
    }
    assert_eq!(seen, [0x07, 0x06, 0x8000_0007, 0x01]);
}

#[test]
fn revision_splits_into_major_minor() {
    assert_eq!(split_revision(0x0002_0050), (2, 80));
    assert_eq!(split_revision(0x0001_0000), (1, 0));
}

#[test]
fn hex_field_renders_lowercase_hex() {
    let line = ReportLine::hex_field("Firmware Revision", 0x10000);
    assert_eq!(line.content(), "Firmware Revision: 0x10000");
}

#[test]
fn version_field_renders_decimal_pair() {
    let (major, minor) = split_revision(0x0002_0050);
    let line = ReportLine::version_field("UEFI Version", major, minor);
    assert_eq!(line.content(), "UEFI Version: 2.80");
}

#[test]
fn text_field_renders_name_and_value() {
    let line = ReportLine::text_field("Firmware Vendor", "EDK II");
    assert_eq!(line.content(), "Firmware Vendor: EDK II");
    let line = ReportLine::text_field("SGX", label(true));
    assert_eq!(line.content(), "SGX: enable");
}

#[test]
fn forms_differ_only_in_terminator_and_width() {
    let line = ReportLine::text_field("SMEP", "disable");

    let console = line.console_form();
    assert!(console.ends_with('\n'));
    assert!(!console.ends_with("\r\n"));
    assert_eq!(&console[..console.len() - 1], line.content());

    let file = line.file_form();
    assert!(file.ends_with(b"\r\n"));
    assert_eq!(&file[..file.len() - 2], line.content().as_bytes());
}

#[test]
fn ascii_projection_keeps_low_byte() {
    assert_eq!(ascii_projection("abc"), b"abc");
    // U+00E9 projects to 0xE9, U+3042 to 0x42; wide input corrupts, by
    // contract.
    assert_eq!(ascii_projection("\u{e9}\u{3042}"), [0xe9, 0x42]);
}

#[test]
fn long_content_truncates_below_ceiling() {
    let long = "a".repeat(MAX_LINE_UNITS * 2);
    let line = ReportLine::text_field("Firmware Vendor", &long);
    assert_eq!(line.content().chars().count(), MAX_LINE_UNITS - 2);
    assert_eq!(line.file_form().len(), MAX_LINE_UNITS);
    assert_eq!(line.console_form().chars().count(), MAX_LINE_UNITS - 1);
}

#[cfg(target_arch = "x86_64")]
#[test]
fn leaf_requery_is_deterministic() {
    let first = LeafSnapshot::query(0x07);
    let second = LeafSnapshot::query(0x07);
    assert_eq!(first, second);
}
