use std::sync::Arc;

use pprovider::{
    CredentialErrorKind, CredentialResolver, FileSecretStore, InMemorySecretStore, ProviderKind,
    SecretStore,
};

fn resolver(store: InMemorySecretStore) -> CredentialResolver {
    CredentialResolver::new(Arc::new(store)).with_env_export(false)
}

#[test]
fn first_usable_secret_in_priority_order_wins() {
    let resolver = resolver(
        InMemorySecretStore::new()
            .with_secret("MISTRAL_API_KEY", "m-key")
            .with_secret("OPENAI_API_KEY", "o-key"),
    );

    let active = resolver.resolve().expect("a key is present");
    assert_eq!(active.provider(), ProviderKind::OpenAi);
    assert_eq!(active.model, "gpt-4");
    assert_eq!(active.credential.api_key(), "o-key");
    assert_eq!(resolver.active().as_deref(), Some(active.as_ref()));
}

#[test]
fn empty_secrets_are_skipped() {
    let resolver = resolver(
        InMemorySecretStore::new()
            .with_secret("ANTHROPIC_API_KEY", "   ")
            .with_secret("GOOGLE_API_KEY", "g-key"),
    );

    let active = resolver.resolve().expect("google key is usable");
    assert_eq!(active.provider(), ProviderKind::Google);
    assert_eq!(active.model, "gemini-pro");
}

#[test]
fn no_usable_secret_reports_every_lookup() {
    let resolver = resolver(InMemorySecretStore::new().with_secret("OPENAI_API_KEY", ""));

    let error = resolver.resolve().expect_err("nothing usable");
    assert_eq!(error.kind, CredentialErrorKind::NoCredentialAvailable);
    assert_eq!(error.lookups.len(), 5);
    assert_eq!(error.lookups[0].secret_name, "ANTHROPIC_API_KEY");
    assert_eq!(error.lookups[0].reason, "not set");
    assert_eq!(error.lookups[1].reason, "empty value");
    assert!(resolver.active().is_none());
}

#[test]
fn custom_priority_changes_the_winner() {
    let resolver = resolver(
        InMemorySecretStore::new()
            .with_secret("ANTHROPIC_API_KEY", "a-key")
            .with_secret("OPENROUTER_API_KEY", "or-key"),
    )
    .with_priority(vec![ProviderKind::OpenRouter, ProviderKind::Anthropic]);

    assert_eq!(
        resolver.resolve().expect("resolves").provider(),
        ProviderKind::OpenRouter
    );
}

#[tokio::test]
async fn saving_the_active_provider_refreshes_config_and_broadcasts() {
    let resolver = resolver(InMemorySecretStore::new().with_secret("OPENAI_API_KEY", "old"));
    resolver.resolve().expect("resolves");
    resolver.select_model("gpt-3.5-turbo").expect("model selected");
    let mut changes = resolver.subscribe();

    resolver
        .save_credential(ProviderKind::OpenAi, "  new-key  ")
        .expect("save succeeds");

    let active = resolver.active().expect("still active");
    assert_eq!(active.credential.api_key(), "new-key");
    assert_eq!(active.model, "gpt-3.5-turbo");

    let change = changes.recv().await.expect("change broadcast");
    assert_eq!(change.provider, ProviderKind::OpenAi);
    assert_eq!(change.secret_name, "OPENAI_API_KEY");
}

#[test]
fn saving_another_provider_leaves_active_config_alone() {
    let resolver = resolver(InMemorySecretStore::new().with_secret("ANTHROPIC_API_KEY", "a"));
    resolver.resolve().expect("resolves");

    resolver
        .save_credential(ProviderKind::Google, "g-key")
        .expect("save succeeds");
    assert_eq!(
        resolver.active().expect("active").provider(),
        ProviderKind::Anthropic
    );

    let error = resolver
        .save_credential(ProviderKind::Google, " ")
        .expect_err("blank secret rejected");
    assert_eq!(error.kind, CredentialErrorKind::InvalidSecret);
}

#[test]
fn file_store_is_shared_across_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("secrets.json");

    let writer = CredentialResolver::new(Arc::new(FileSecretStore::new(&path)))
        .with_env_export(false);
    writer
        .save_credential(ProviderKind::Mistral, "m-key")
        .expect("save succeeds");

    let reader = FileSecretStore::new(&path);
    assert_eq!(
        reader.get("MISTRAL_API_KEY").expect("readable").as_deref(),
        Some("m-key")
    );

    let resolved = CredentialResolver::new(Arc::new(reader))
        .with_env_export(false)
        .resolve()
        .expect("resolves from file");
    assert_eq!(resolved.provider(), ProviderKind::Mistral);
}

#[test]
fn corrupt_secret_file_is_a_lookup_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("secrets.json");
    std::fs::write(&path, "{not json").expect("write");

    let error = CredentialResolver::new(Arc::new(FileSecretStore::new(&path)))
        .with_env_export(false)
        .resolve()
        .expect_err("nothing readable");
    assert!(error.lookups.iter().all(|lookup| lookup.reason.contains("corrupt")));
}
