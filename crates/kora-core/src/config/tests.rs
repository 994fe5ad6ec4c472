use super::*;
use std::collections::HashMap;

#[test]
fn test_defaults_when_sections_missing() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.chat.command_prefix, "/");
    assert_eq!(cfg.chat.max_message_len, 2000);
    assert_eq!(cfg.memory.retention, 20);
    assert_eq!(cfg.intent.image_command, "imagine");
    assert!(cfg.intent.enabled);
    assert_eq!(cfg.plugins.timeout_secs, 30);
    assert!(cfg.channel.messenger.is_none());
    assert!(!cfg.api.enabled);
    assert_eq!(cfg.api.host, "127.0.0.1");
    assert_eq!(cfg.api.port, 3001);
}

#[test]
fn test_full_config_from_toml() {
    let toml_str = r#"
        [kora]
        name = "Test Bot"
        data_dir = "/tmp/kora"

        [chat]
        command_prefix = "!"
        admin_id = "1234"
        max_message_len = 640

        [memory]
        db_path = "/tmp/kora/memory.db"
        retention = 12

        [provider.gemini]
        api_key = "AIza-test"
        timeout_secs = 15

        [channel.messenger]
        enabled = true
        page_access_token = "EAAB"
        verify_token = "secret"
        port = 8080

        [api]
        enabled = true
        port = 9090
        api_key = "tok"

        [[intent.extra_examples]]
        text = "sketch me a boat"
        label = "generate_image"
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.kora.name, "Test Bot");
    assert_eq!(cfg.chat.command_prefix, "!");
    assert_eq!(cfg.chat.admin_id, "1234");
    assert_eq!(cfg.chat.max_message_len, 640);
    assert_eq!(cfg.chat.seed_history, 10);
    assert_eq!(cfg.memory.retention, 12);

    let gemini = cfg.provider.gemini.unwrap();
    assert_eq!(gemini.api_key, "AIza-test");
    assert_eq!(gemini.model, "gemini-1.5-flash");
    assert_eq!(gemini.timeout_secs, 15);

    let messenger = cfg.channel.messenger.unwrap();
    assert!(messenger.enabled);
    assert_eq!(messenger.port, 8080);
    assert_eq!(messenger.host, "0.0.0.0");
    assert_eq!(messenger.graph_api_version, "v22.0");

    assert_eq!(cfg.intent.extra_examples.len(), 1);
    assert_eq!(cfg.intent.extra_examples[0].label, "generate_image");

    assert!(cfg.api.enabled);
    assert_eq!(cfg.api.port, 9090);
    assert_eq!(cfg.api.host, "127.0.0.1");
    assert_eq!(cfg.api.api_key, "tok");
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        ("GEMINI_API_KEY", "env-key"),
        ("PAGE_ACCESS_TOKEN", "env-page"),
        ("VERIFY_TOKEN", "env-verify"),
        ("ADMIN_ID", "999"),
        ("PREFIX", "  "),
    ]
    .into_iter()
    .collect();

    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));

    assert_eq!(cfg.provider.gemini.as_ref().unwrap().api_key, "env-key");
    let messenger = cfg.channel.messenger.as_ref().unwrap();
    assert!(messenger.enabled, "a page token enables messenger");
    assert_eq!(messenger.page_access_token, "env-page");
    assert_eq!(messenger.verify_token, "env-verify");
    assert_eq!(cfg.chat.admin_id, "999");
    // Blank values are ignored.
    assert_eq!(cfg.chat.command_prefix, "/");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__kora_config__.toml").unwrap();
    assert_eq!(cfg.kora.name, "KORA AI");
}

#[test]
fn test_load_invalid_toml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[chat\nbroken").unwrap();
    let err = load(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, KoraError::Config(_)));
}

#[test]
fn test_install_bundled_prompts_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_str().unwrap();

    install_bundled_prompts(data_dir);
    let prompt_path = dir.path().join("prompts/SYSTEM_PROMPT.md");
    assert!(prompt_path.exists(), "SYSTEM_PROMPT.md should be deployed");
    let content = std::fs::read_to_string(&prompt_path).unwrap();
    assert!(content.contains("## System"));
    assert!(content.contains("## Image Analysis"));

    // User edits survive a second install and are picked up by load().
    std::fs::write(&prompt_path, "## System\ncustom system\n").unwrap();
    install_bundled_prompts(data_dir);
    let prompts = Prompts::load(data_dir);
    assert_eq!(prompts.system, "custom system");
    assert_eq!(prompts.image_analysis, Prompts::default().image_analysis);
}
