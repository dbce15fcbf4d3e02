use std::collections::BTreeMap;

use xnl_netlist::{Design, LinkOwner};
use xnl_xnf::{xnfio, xnfio_with, OnError, TaggedDevices, XnfioError, XnfioOptions, LCA_ATTRIBUTE, OBUF};

macro_rules! parse {
    ($source:expr) => {{
        let _ = env_logger::try_init();
        xnl_netlist::parse($source).unwrap()
    }};
}

#[track_caller]
fn assert_design(design: &Design, gold: &str) {
    assert_eq!(format!("{design}"), format!("{}", parse!(gold)));
}

#[test]
fn test_not_a_pad() {
    let source = r#"
        &"a":1 wire
        &"b":1 wire { "PAD"="" }
        &"c":2 wire { "LOC"="P7" }
        %"u1":2 not
        ring &"a"+0 %"u1"+1
        ring &"b"+0 %"u1"+0 &"c"+1
    "#;
    let mut design = parse!(source);
    xnfio(&mut design).unwrap();
    assert_design(&design, source);
}

#[test]
fn test_obuf_reuse_buf() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        &"x":1 wire
        %"u1":2 buf
        ring &"x"+0 %"u1"+1
        ring &"o"+0 %"u1"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="o" }
        &"x":1 wire
        %"u1":2 buf { "XNF-LCA"="OBUF:O,I" }
        ring &"x"+0 %"u1"+1
        ring &"o"+0 %"u1"+0
    "#,
    );
}

#[test]
fn test_obuf_reuse_not() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="O" }
        &"x":1 wire
        %"u1":2 not
        ring &"x"+0 %"u1"+1
        ring &"o"+0 %"u1"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="O" }
        &"x":1 wire
        %"u1":2 not { "XNF-LCA"="OBUF:O,~I" }
        ring &"x"+0 %"u1"+1
        ring &"o"+0 %"u1"+0
    "#,
    );
}

#[test]
fn test_obuf_retag() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        %"u1":2 buf { "XNF-LCA"="IBUF:O,I" }
        ring &"o"+0 %"u1"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="o" }
        %"u1":2 buf { "XNF-LCA"="OBUF:O,I" }
        ring &"o"+0 %"u1"+0
    "#,
    );
}

#[test]
fn test_obuf_insert() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        &"a":1 wire
        &"b":1 wire
        %"u1":3 and
        ring &"a"+0 %"u1"+1
        ring &"b"+0 %"u1"+2
        ring &"o"+0 %"u1"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="o" }
        &"a":1 wire
        &"b":1 wire
        &"$._L1":1 wire
        %"u1":3 and
        %"$._L0":2 buf { "XNF-LCA"="OBUF:O,I" }
        ring &"a"+0 %"u1"+1
        ring &"b"+0 %"u1"+2
        ring &"o"+0 %"$._L0"+0
        ring &"$._L1"+0 %"$._L0"+1 %"u1"+0
    "#,
    );
    assert!(design.unnamed_rings().is_empty());
}

#[test]
fn test_obuf_insert_named_ring() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        &"y":1 wire
        %"u1":3 and
        ring &"o"+0 %"u1"+0 &"y"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="o" }
        &"y":1 wire
        %"u1":3 and
        %"$._L0":2 buf { "XNF-LCA"="OBUF:O,I" }
        ring &"o"+0 %"$._L0"+0
        ring &"y"+0 %"$._L0"+1 %"u1"+0
    "#,
    );
}

#[test]
fn test_obuf_buf_with_fanout() {
    // the buffer also feeds an inverter, so it cannot move into the IOB
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        &"y":1 wire
        %"u1":2 buf
        %"u2":2 not
        %"u3":2 buf
        ring &"o"+0 %"u1"+0 %"u2"+1
        ring &"y"+0 %"u2"+0 %"u3"+1
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="o" }
        &"y":1 wire
        &"$._L1":1 wire
        %"u1":2 buf
        %"u2":2 not
        %"u3":2 buf
        %"$._L0":2 buf { "XNF-LCA"="OBUF:O,I" }
        ring &"o"+0 %"$._L0"+0
        ring &"y"+0 %"u2"+0 %"u3"+1
        ring &"$._L1"+0 %"$._L0"+1 %"u1"+0 %"u2"+1
    "#,
    );
}

#[test]
fn test_obuf_first_match_not() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        %"d":3 and
        %"u1":2 not
        %"u2":2 buf
        ring &"o"+0 %"u1"+1 %"u2"+1 %"d"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="o" }
        %"d":3 and
        %"u1":2 not { "XNF-LCA"="OBUF:O,~I" }
        %"u2":2 buf
        ring &"o"+0 %"u1"+1 %"u2"+1 %"d"+0
    "#,
    );
}

#[test]
fn test_obuf_first_match_buf() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        %"d":3 and
        %"u1":2 not
        %"u2":2 buf
        ring &"o"+0 %"u2"+1 %"u1"+1 %"d"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="o" }
        %"d":3 and
        %"u1":2 not
        %"u2":2 buf { "XNF-LCA"="OBUF:O,I" }
        ring &"o"+0 %"u2"+1 %"u1"+1 %"d"+0
    "#,
    );
}

#[test]
fn test_obuf_reuse_checks_output_pin() {
    // u1 hangs off the pad by its input; only its own output ring is looked at
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        %"d":3 and
        %"u1":2 buf
        ring &"o"+0 %"d"+0 %"u1"+1
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"o":1 wire { "PAD"="o" }
        %"d":3 and
        %"u1":2 buf { "XNF-LCA"="OBUF:O,I" }
        ring &"o"+0 %"d"+0 %"u1"+1
    "#,
    );
}

#[test]
fn test_obuf_statistics() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        %"u1":3 and
        ring &"o"+0 %"u1"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_eq!(
        design.statistics(),
        BTreeMap::from([("and".to_owned(), 1), ("buf".to_owned(), 1), ("XNF-LCA:OBUF:O,I".to_owned(), 1)])
    );
}

#[test]
fn test_obuf_second_run_reuses_buffer() {
    let source = r#"
        &"o":1 wire { "PAD"="o" }
        %"u1":3 and
        ring &"o"+0 %"u1"+0
    "#;
    let mut design = parse!(source);
    xnfio(&mut design).unwrap();
    let once = design.to_string();
    assert_eq!((design.net_count(), design.device_count()), (2, 2));
    xnfio(&mut design).unwrap();
    assert_eq!(design.to_string(), once);
}

#[test]
fn test_obuf_second_run_skip_tagged() {
    let options = XnfioOptions { tagged_devices: TaggedDevices::Skip, ..Default::default() };
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        %"u1":3 and
        ring &"o"+0 %"u1"+0
    "#
    );
    xnfio_with(&mut design, options).unwrap();
    xnfio_with(&mut design, options).unwrap();
    assert_eq!((design.net_count(), design.device_count()), (3, 3));
    let o = design.find_net("o").unwrap();
    let outer = design.find_device("$._L2").unwrap();
    let pad_ring = Vec::from_iter(design.ring(design.net_pin(o, 0)).map(|link| design.link_owner(link)));
    assert_eq!(pad_ring, vec![LinkOwner::Device(outer, 0)]);
    for name in ["$._L0", "$._L2"] {
        let device = design.find_device(name).unwrap();
        assert_eq!(design.device(device).attribute(LCA_ATTRIBUTE), OBUF);
    }
    assert!(design.unnamed_rings().is_empty());
}

#[test]
fn test_ibuf_reuse_buf() {
    let mut design = parse!(
        r#"
        &"i":1 wire { "PAD"="i" }
        &"x":1 wire
        %"u1":2 buf
        ring &"i"+0 %"u1"+1
        ring &"x"+0 %"u1"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"i":1 wire { "PAD"="i" }
        &"x":1 wire
        %"u1":2 buf { "XNF-LCA"="IBUF:O,I" }
        ring &"i"+0 %"u1"+1
        ring &"x"+0 %"u1"+0
    "#,
    );
}

#[test]
fn test_ibuf_reuse_checks_input_pin() {
    let mut design = parse!(
        r#"
        &"i":1 wire { "PAD"="i" }
        %"c":3 and
        %"u1":2 buf
        ring &"i"+0 %"u1"+0 %"c"+1
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"i":1 wire { "PAD"="i" }
        %"c":3 and
        %"u1":2 buf { "XNF-LCA"="IBUF:O,I" }
        ring &"i"+0 %"u1"+0 %"c"+1
    "#,
    );
}

#[test]
fn test_ibuf_no_inverting_reuse() {
    let mut design = parse!(
        r#"
        &"i":1 wire { "PAD"="I" }
        &"x":1 wire
        %"u1":2 not
        ring &"i"+0 %"u1"+1
        ring &"x"+0 %"u1"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"i":1 wire { "PAD"="I" }
        &"x":1 wire
        &"$._L1":1 wire
        %"u1":2 not
        %"$._L0":2 buf { "XNF-LCA"="IBUF:O,I" }
        ring &"i"+0 %"$._L0"+1
        ring &"x"+0 %"u1"+0
        ring &"$._L1"+0 %"$._L0"+0 %"u1"+1
    "#,
    );
    let once = design.to_string();
    xnfio(&mut design).unwrap();
    assert_eq!(design.to_string(), once);
}

#[test]
fn test_ibuf_shared_input() {
    let mut design = parse!(
        r#"
        &"i":1 wire { "PAD"="i" }
        &"x":1 wire
        %"u1":2 buf
        %"u2":3 and
        ring &"i"+0 %"u1"+1 %"u2"+1 &"x"+0
    "#
    );
    xnfio(&mut design).unwrap();
    assert_design(
        &design,
        r#"
        &"i":1 wire { "PAD"="i" }
        &"x":1 wire
        %"u1":2 buf
        %"u2":3 and
        %"$._L0":2 buf { "XNF-LCA"="IBUF:O,I" }
        ring &"i"+0 %"$._L0"+1
        ring &"x"+0 %"$._L0"+0 %"u1"+1 %"u2"+1
    "#,
    );
}

#[test]
fn test_unsupported_pad() {
    let mut design = parse!(
        r#"
        &"p":1 wire { "PAD"="b" }
        %"u1":2 buf
        ring &"p"+0 %"u1"+0
    "#
    );
    assert_eq!(xnfio(&mut design), Err(XnfioError::Unsupported { net: "p".into(), value: "b".into() }));
}

#[test]
fn test_pad_pin_count() {
    let mut design = parse!(
        r#"
        &"p":2 wire { "PAD"="o" }
        %"u1":2 buf
        ring &"p"+0 %"u1"+0
    "#
    );
    assert!(matches!(xnfio(&mut design), Err(XnfioError::InvariantViolation { net, .. }) if net == "p"));
}

#[test]
fn test_undriven_output_pad() {
    let mut design = parse!(
        r#"
        &"o":1 wire { "PAD"="o" }
        %"u1":2 buf
        ring &"o"+0 %"u1"+1
    "#
    );
    assert_eq!(
        xnfio(&mut design),
        Err(XnfioError::InvariantViolation { net: "o".into(), reason: "output pad is not driven".into() })
    );
}

#[test]
fn test_unused_input_pad() {
    let mut design = parse!(
        r#"
        &"i":1 wire { "PAD"="i" }
        %"u1":2 buf
        ring &"i"+0 %"u1"+0
    "#
    );
    assert_eq!(
        xnfio(&mut design),
        Err(XnfioError::InvariantViolation { net: "i".into(), reason: "input pad is not used".into() })
    );
}

#[test]
fn test_abort_stops_at_first_error() {
    let mut design = parse!(
        r#"
        &"bad":1 wire { "PAD"="x" }
        &"o":1 wire { "PAD"="o" }
        %"u1":3 and
        ring &"o"+0 %"u1"+0
    "#
    );
    let before = design.to_string();
    assert!(xnfio(&mut design).is_err());
    assert_eq!(design.to_string(), before);
}

#[test]
fn test_skip_net_continues() {
    let options = XnfioOptions { on_error: OnError::SkipNet, ..Default::default() };
    let mut design = parse!(
        r#"
        &"bad":1 wire { "PAD"="x" }
        &"o":1 wire { "PAD"="o" }
        %"u1":2 buf
        ring &"o"+0 %"u1"+0
    "#
    );
    assert_eq!(
        xnfio_with(&mut design, options),
        Err(XnfioError::Unsupported { net: "bad".into(), value: "x".into() })
    );
    assert_design(
        &design,
        r#"
        &"bad":1 wire { "PAD"="x" }
        &"o":1 wire { "PAD"="o" }
        %"u1":2 buf { "XNF-LCA"="OBUF:O,I" }
        ring &"o"+0 %"u1"+0
    "#,
    );
}

#[test]
fn test_error_display() {
    let error = XnfioError::Unsupported { net: "p".into(), value: "io".into() };
    assert_eq!(error.to_string(), "pad net \"p\": unsupported pad kind \"io\"");
}
