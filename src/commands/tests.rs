use super::*;
use async_trait::async_trait;
use axum::{http::header, routing::get, Router};
use kora_core::{
    error::KoraError,
    result::{Payload, StructuredMessage},
    traits::Notifier,
};
use std::sync::Mutex as StdMutex;
use std::time::Instant;

// ---------------------------------------------------------------------------
// Test plugins
// ---------------------------------------------------------------------------

struct EchoPlugin;

#[async_trait]
impl CommandPlugin for EchoPlugin {
    fn name(&self) -> &str {
        "Echo"
    }

    async fn execute(&self, args: &str, sender_id: &str) -> Result<HandlerResult, KoraError> {
        Ok(HandlerResult::PlainText(format!("{sender_id}:{args}")))
    }
}

struct FailingPlugin;

#[async_trait]
impl CommandPlugin for FailingPlugin {
    fn name(&self) -> &str {
        "fail"
    }

    fn description(&self) -> &str {
        "Always fails."
    }

    async fn execute(&self, _args: &str, _sender_id: &str) -> Result<HandlerResult, KoraError> {
        Err(KoraError::Plugin("upstream exploded".into()))
    }
}

struct PanickingPlugin;

#[async_trait]
impl CommandPlugin for PanickingPlugin {
    fn name(&self) -> &str {
        "panic"
    }

    async fn execute(&self, _args: &str, _sender_id: &str) -> Result<HandlerResult, KoraError> {
        panic!("plugin bug");
    }
}

struct SlowPlugin;

#[async_trait]
impl CommandPlugin for SlowPlugin {
    fn name(&self) -> &str {
        "slow"
    }

    async fn execute(&self, _args: &str, _sender_id: &str) -> Result<HandlerResult, KoraError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".into())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: StdMutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_admin(&self, text: &str) -> Result<(), KoraError> {
        if self.fail {
            return Err(KoraError::Channel("admin unreachable".into()));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn test_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new("/", Duration::from_millis(200));
    registry.register(EchoPlugin);
    registry.register(FailingPlugin);
    registry.register(PanickingPlugin);
    registry.register(SlowPlugin);
    registry
}

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_dispatch_is_case_insensitive() {
    let registry = test_registry();
    let result = registry.dispatch("ECHO", "hi there", "u1").await;
    assert_eq!(result, HandlerResult::PlainText("u1:hi there".into()));
    assert!(registry.contains("echo"));
    assert!(registry.contains("Echo"));
}

#[tokio::test]
async fn test_dispatch_unknown_command() {
    let registry = test_registry();
    let result = registry.dispatch("nope", "", "u1").await;
    let text = result.as_text().unwrap();
    assert!(text.contains("\"nope\" not found"));
    assert!(text.contains("/help"));
}

#[tokio::test]
async fn test_dispatch_never_fails() {
    let registry = test_registry();
    for name in ["echo", "fail", "panic", "slow", "", "ünïcode", "a b"] {
        for args in ["", "x", "  spaced  out  "] {
            // Every call yields a result; none propagates a failure.
            let result = registry.dispatch(name, args, "u1").await;
            assert!(result.as_text().is_some(), "{name}/{args}");
        }
    }
}

#[tokio::test]
async fn test_plugin_error_becomes_generic_failure() {
    let registry = test_registry();
    let result = registry.dispatch("fail", "", "u1").await;
    assert_eq!(result, HandlerResult::PlainText(COMMAND_FAILED.into()));
    // The raw error payload never reaches the user.
    assert!(!result.as_text().unwrap().contains("exploded"));
}

#[tokio::test]
async fn test_plugin_panic_is_contained() {
    let registry = test_registry();
    let result = registry.dispatch("panic", "", "u1").await;
    assert_eq!(result, HandlerResult::PlainText(COMMAND_FAILED.into()));
    // The registry keeps working afterwards.
    let result = registry.dispatch("echo", "still here", "u1").await;
    assert_eq!(result.as_text(), Some("u1:still here"));
}

#[tokio::test]
async fn test_plugin_timeout() {
    let registry = test_registry();
    let start = Instant::now();
    let result = registry.dispatch("slow", "", "u1").await;
    assert_eq!(result, HandlerResult::PlainText(COMMAND_FAILED.into()));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_descriptions_sorted_with_default() {
    let registry = test_registry();
    let descriptions = registry.descriptions();
    let names: Vec<&str> = descriptions.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["echo", "fail", "panic", "slow"]);
    assert_eq!(descriptions[0].1, "No description available.");
    assert_eq!(descriptions[1].1, "Always fails.");
}

// ---------------------------------------------------------------------------
// Built-in plugins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_help_lists_registered_commands() {
    let mut registry = CommandRegistry::new("/", Duration::from_secs(5));
    registry.register(UpPlugin::new("KORA AI", Instant::now(), None));
    registry.register(AdminPlugin::new("42", "/"));
    let help = HelpPlugin::new("KORA AI", "/", registry.descriptions());
    registry.register(help);

    let result = registry.dispatch("help", "", "u1").await;
    let HandlerResult::PlainText(text) = result else {
        panic!("help should be plain text");
    };
    assert!(text.contains("KORA AI Command List"));
    for name in ["/admin", "/help", "/up"] {
        assert!(text.contains(name), "missing {name}");
    }
    assert!(text.contains("Show how long the bot has been running."));
    // Sorted listing.
    assert!(text.find("/admin").unwrap() < text.find("/help").unwrap());
    assert!(text.find("/help").unwrap() < text.find("/up").unwrap());
}

#[tokio::test]
async fn test_help_uses_configured_prefix() {
    let help = HelpPlugin::new("KORA AI", "!", vec![("up".into(), "Uptime".into())]);
    let text = help.execute("", "u1").await.unwrap();
    assert!(text.as_text().unwrap().contains("📌 !up"));
}

#[tokio::test]
async fn test_up_reports_uptime() {
    let up = UpPlugin::new("KORA AI", Instant::now(), None);
    let result = up.execute("", "u1").await.unwrap();
    let text = result.as_text().unwrap();
    assert!(text.starts_with("🤖 KORA AI Uptime"));
    assert!(text.contains("0d 0h 0m"));
    assert!(text.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_format_duration() {
    assert_eq!(up::format_duration(Duration::from_secs(0)), "0d 0h 0m 0s");
    assert_eq!(
        up::format_duration(Duration::from_secs(86_400 + 2 * 3600 + 3 * 60 + 4)),
        "1d 2h 3m 4s"
    );
}

#[tokio::test]
async fn test_admin_denies_other_senders() {
    let admin = AdminPlugin::new("42", "/");
    let result = admin.execute("", "7").await.unwrap();
    assert_eq!(
        result,
        HandlerResult::Structured(StructuredMessage::failure(admin::ADMIN_ONLY))
    );

    let result = admin.execute("", "42").await.unwrap();
    match result {
        HandlerResult::Structured(msg) => {
            assert!(msg.success);
            assert!(result_text(&msg).contains("Welcome, Admin"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_admin_without_configured_owner_denies_everyone() {
    let admin = AdminPlugin::new("", "/");
    let result = admin.execute("", "").await.unwrap();
    assert_eq!(result.as_text(), Some(admin::ADMIN_ONLY));
}

#[tokio::test]
async fn test_report_forwards_to_admin() {
    let notifier = Arc::new(RecordingNotifier::default());
    let report = ReportPlugin::new(notifier.clone());

    let result = report.execute("the bot is slow", "user-9").await.unwrap();
    assert!(result.as_text().unwrap().starts_with("✅"));

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Message From: user-9"));
    assert!(sent[0].contains("the bot is slow"));
}

#[tokio::test]
async fn test_report_requires_message() {
    let notifier = Arc::new(RecordingNotifier::default());
    let report = ReportPlugin::new(notifier.clone());
    let result = report.execute("   ", "user-9").await.unwrap();
    assert!(result.as_text().unwrap().contains("Please provide a message"));
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_report_notifier_failure() {
    let notifier = Arc::new(RecordingNotifier {
        fail: true,
        ..Default::default()
    });
    let report = ReportPlugin::new(notifier);
    let result = report.execute("hello", "user-9").await.unwrap();
    assert!(result.as_text().unwrap().starts_with("⚠️"));
}

#[tokio::test]
async fn test_imagine_empty_prompt() {
    let imagine =
        ImaginePlugin::new("http://127.0.0.1:9/{prompt}", Duration::from_secs(1), "/").unwrap();
    let result = imagine.execute("  ", "u1").await.unwrap();
    match result {
        HandlerResult::List(items) => {
            assert_eq!(items.len(), 1);
            assert!(!items[0].success);
            assert!(result_text(&items[0]).contains("/imagine <prompt>"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_imagine_returns_image_then_caption() {
    let router = Router::new().route(
        "/prompt/{prompt}",
        get(|axum::extract::Path(prompt): axum::extract::Path<String>| async move {
            let body = format!("PNG:{prompt}").into_bytes();
            ([(header::CONTENT_TYPE, "image/png")], body)
        }),
    );
    let base = spawn_server(router).await;
    let imagine = ImaginePlugin::new(
        &format!("{base}/prompt/{{prompt}}"),
        Duration::from_secs(5),
        "/",
    )
    .unwrap();

    let result = imagine.execute("a red fox", "u1").await.unwrap();
    let HandlerResult::List(items) = result else {
        panic!("imagine should return a list");
    };
    assert_eq!(items.len(), 2);
    match &items[0].payload {
        Payload::Image { data, mime_type } => {
            assert_eq!(mime_type, "image/png");
            assert_eq!(data, b"PNG:a red fox");
        }
        other => panic!("expected image first, got {other:?}"),
    }
    assert!(result_text(&items[1]).contains("a red fox"));
}

#[tokio::test]
async fn test_imagine_api_error_is_structured_failure() {
    let router = Router::new().route(
        "/prompt/{prompt}",
        get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let base = spawn_server(router).await;
    let imagine = ImaginePlugin::new(
        &format!("{base}/prompt/{{prompt}}"),
        Duration::from_secs(5),
        "/",
    )
    .unwrap();

    let HandlerResult::List(items) = imagine.execute("cat", "u1").await.unwrap() else {
        panic!("imagine should return a list");
    };
    assert_eq!(items.len(), 1);
    assert!(!items[0].success);
}

fn result_text(msg: &StructuredMessage) -> &str {
    match &msg.payload {
        Payload::Text(text) => text,
        Payload::Image { .. } => "",
    }
}
