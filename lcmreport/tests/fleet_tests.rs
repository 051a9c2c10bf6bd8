mod common;

use common::{DeviceScript, KeyValueParser, ScriptedShell, context, inventory};
use lcmreport::notify::{FAILURE_FOOTER, FAILURE_HEADER, SUCCESS_TEXT, summary};
use lcmreport::{
    FactExtractor, Fleet, MemoryReport, ReportSchema, ReportSink, UNKNOWN, XlsxReport,
};

const STACK: &str = "switch=1\nmac_address=00a3.d1e5.2b00\n---\nswitch=2\nmac_address=00a3.d1e5.4a80";

fn healthy() -> DeviceScript {
    DeviceScript::default()
        .answer("show version", "version=17.9.4a\nuptime=12 weeks, 3 days")
        .answer("show switch", STACK)
}

#[tokio::test]
async fn test_mixed_fleet_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let schema = ReportSchema::builtin("catalyst-basic").unwrap();
    let shell = ScriptedShell::new()
        .device("A", healthy())
        .device("B", DeviceScript::unreachable())
        .device(
            "C",
            DeviceScript::default()
                .answer("show version", "version=16.12.5\nuptime=4 days")
                .reject("show switch", "% Invalid input detected at '^' marker."),
        );
    let mut report = XlsxReport::create(&ctx.paths.report, &schema).unwrap();

    let result = Fleet::new(&ctx, &shell, &KeyValueParser, &schema)
        .run(&inventory(&["A", "B", "C"]), &mut report)
        .await;

    assert_eq!(result.failed_devices, ["B", "C"]);
    assert_eq!(result.polled, 3);
    assert_eq!(result.report_path, ctx.paths.report);
    assert_eq!(result.run_log_path, ctx.paths.run_log);

    let general = report.read_sheet("General").unwrap();
    assert_eq!(
        general,
        vec![
            vec!["Device", "Software", "Uptime"],
            vec!["A", "17.9.4a", "12 weeks, 3 days"],
            vec!["B", UNKNOWN, UNKNOWN],
            vec!["C", "16.12.5", "4 days"],
        ]
    );

    let serials = report.read_sheet("Serial and Mac").unwrap();
    assert_eq!(
        serials,
        vec![
            vec!["Device", "Mac"],
            vec!["A", "00a3.d1e5.2b00"],
            vec!["A", "00a3.d1e5.4a80"],
            vec!["C", UNKNOWN],
        ]
    );

    assert!(ctx.session_log_path("A").exists());
    assert!(!ctx.session_log_path("B").exists());
    assert!(ctx.session_log_path("C").exists());

    let transcript = std::fs::read_to_string(ctx.session_log_path("C")).unwrap();
    assert!(transcript.contains("show version"));
    assert!(transcript.contains("show switch"));
}

#[tokio::test]
async fn test_failure_set_matches_unreachable_devices() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let schema = ReportSchema::builtin("catalyst-basic").unwrap();
    let names = ["device1", "device2", "device3", "device4", "device5"];
    let mut shell = ScriptedShell::new();
    for name in names {
        let script = if name == "device2" || name == "device4" {
            DeviceScript::unreachable()
        } else {
            healthy()
        };
        shell = shell.device(name, script);
    }
    let mut report = MemoryReport::new(&schema);

    let result = Fleet::new(&ctx, &shell, &KeyValueParser, &schema)
        .run(&inventory(&names), &mut report)
        .await;

    assert_eq!(result.failed_devices, ["device2", "device4"]);
    assert_eq!(report.rows("General").len(), 5);
    let devices: Vec<_> = report
        .rows("General")
        .iter()
        .map(|row| row[0].as_str())
        .collect();
    assert_eq!(devices, names);
    // Three healthy stacks of two members each.
    assert_eq!(report.rows("Serial and Mac").len(), 6);
}

#[tokio::test]
async fn test_partial_command_failure_keeps_other_facts() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let schema = ReportSchema::builtin("catalyst-basic").unwrap();
    let shell = ScriptedShell::new().device(
        "sw1",
        DeviceScript::default()
            .reject("show version", "% Ambiguous command")
            .answer("show switch", STACK),
    );
    let mut report = MemoryReport::new(&schema);

    let result = Fleet::new(&ctx, &shell, &KeyValueParser, &schema)
        .run(&inventory(&["sw1"]), &mut report)
        .await;

    assert_eq!(result.failed_devices, ["sw1"]);
    assert_eq!(report.rows("General"), [vec!["sw1", UNKNOWN, UNKNOWN]]);
    assert_eq!(report.rows("Serial and Mac")[1], ["sw1", "00a3.d1e5.4a80"]);
}

#[tokio::test]
async fn test_unparseable_output_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let schema = ReportSchema::builtin("catalyst-basic").unwrap();
    let shell = ScriptedShell::new().device(
        "sw1",
        DeviceScript::default()
            .answer("show version", "version=17.9.4a\nuptime=1 day")
            .answer("show switch", "no structure here"),
    );
    let mut report = MemoryReport::new(&schema);

    let result = Fleet::new(&ctx, &shell, &KeyValueParser, &schema)
        .run(&inventory(&["sw1"]), &mut report)
        .await;

    assert_eq!(result.failed_devices, ["sw1"]);
    assert_eq!(report.rows("General"), [vec!["sw1", "17.9.4a", "1 day"]]);
    assert_eq!(report.rows("Serial and Mac"), [vec!["sw1", UNKNOWN]]);
}

#[tokio::test]
async fn test_all_devices_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let schema = ReportSchema::builtin("catalyst-basic").unwrap();
    let shell = ScriptedShell::new()
        .device("sw1", healthy())
        .device("sw2", healthy());
    let mut report = MemoryReport::new(&schema);

    let result = Fleet::new(&ctx, &shell, &KeyValueParser, &schema)
        .run(&inventory(&["sw1", "sw2"]), &mut report)
        .await;

    assert!(result.all_succeeded());
    assert_eq!(summary(&result.failed_devices), SUCCESS_TEXT);
}

#[tokio::test]
async fn test_report_write_error_does_not_stop_run() {
    struct BrokenReport {
        attempts: usize,
    }

    impl ReportSink for BrokenReport {
        fn append_device_rows(
            &mut self,
            _rows: &lcmreport::DeviceRows,
        ) -> Result<(), lcmreport::error::ReportError> {
            self.attempts += 1;
            Err(lcmreport::error::ReportError::Write {
                path: "report.xlsx".into(),
                message: "disk full".into(),
            })
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let schema = ReportSchema::builtin("catalyst-basic").unwrap();
    let shell = ScriptedShell::new()
        .device("sw1", healthy())
        .device("sw2", DeviceScript::unreachable())
        .device("sw3", healthy());
    let mut report = BrokenReport { attempts: 0 };

    let result = Fleet::new(&ctx, &shell, &KeyValueParser, &schema)
        .run(&inventory(&["sw1", "sw2", "sw3"]), &mut report)
        .await;

    assert_eq!(report.attempts, 3);
    assert_eq!(result.failed_devices, ["sw2"]);
}

#[tokio::test]
async fn test_summary_names_failures_in_processing_order() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let schema = ReportSchema::builtin("catalyst-basic").unwrap();
    let shell = ScriptedShell::new()
        .device("zeta", DeviceScript::unreachable())
        .device("alpha", healthy())
        .device("mid", DeviceScript::unreachable());
    let mut report = MemoryReport::new(&schema);

    let result = Fleet::new(&ctx, &shell, &KeyValueParser, &schema)
        .run(&inventory(&["zeta", "alpha", "mid"]), &mut report)
        .await;

    let text = summary(&result.failed_devices);
    assert_eq!(
        text,
        format!("{FAILURE_HEADER}\n  *zeta\n  *mid\n{FAILURE_FOOTER}")
    );
    assert_eq!(text.matches("*zeta").count(), 1);
}

#[tokio::test]
async fn test_extraction_is_idempotent_per_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let schema = ReportSchema::builtin("catalyst-basic").unwrap();
    let shell = ScriptedShell::new().device("sw1", healthy());
    let parser = KeyValueParser;
    let poller = lcmreport::DevicePoller::new(&shell, &parser, &schema.commands);

    let entry = inventory(&["sw1"]);
    let (name, device) = entry.iter().next().unwrap();
    let descriptor = device.descriptor(name, &ctx.credentials, ctx.session_log_path(name));
    let outcome = poller.poll(&descriptor).await;

    let extractor = FactExtractor::new(&schema);
    assert_eq!(extractor.extract(&outcome), extractor.extract(&outcome));
}
