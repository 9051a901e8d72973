//! Check command - report which OCR provider is usable.

use console::style;

use bestby_core::models::config::{BestbyConfig, ProviderKind};
use bestby_core::{AzureOcrClient, PureOcrEngine};

use super::load_config;

pub async fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("Provider setting: {}", provider_label(config.ocr.provider));
    println!();

    let provider = config.ocr.provider;
    let (azure, local) =
        tokio::task::spawn_blocking(move || (check_azure(&config), check_local(&config))).await?;

    report("Azure Computer Vision", &azure);
    report("Local models", &local);

    println!();
    match selected_provider(provider, &azure, &local) {
        Some(name) => println!("{} Active provider: {}", style("✓").green(), name),
        None => println!(
            "{} No OCR provider available; image extraction will return no date",
            style("✗").yellow()
        ),
    }

    Ok(())
}

fn provider_label(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Auto => "auto",
        ProviderKind::Azure => "azure",
        ProviderKind::Local => "local",
        ProviderKind::None => "none",
    }
}

/// Outcome of probing one provider.
enum Status {
    NotConfigured(String),
    Ok(String),
    Failed(String),
}

fn report(name: &str, status: &Status) {
    match status {
        Status::Ok(detail) => println!("{} {}: {}", style("✓").green(), name, detail),
        Status::NotConfigured(detail) => println!("{} {}: {}", style("-").dim(), name, detail),
        Status::Failed(detail) => println!("{} {}: {}", style("✗").red(), name, detail),
    }
}

fn check_azure(config: &BestbyConfig) -> Status {
    if !config.azure.is_configured() {
        return Status::NotConfigured("endpoint or key not set".to_string());
    }

    let client = match AzureOcrClient::from_config(&config.azure, config.ocr.timeout_secs) {
        Ok(client) => client,
        Err(e) => return Status::Failed(e.to_string()),
    };

    match client.check_connection() {
        Ok(()) => Status::Ok(format!("reachable at {}", client.request_url())),
        Err(e) => Status::Failed(e.to_string()),
    }
}

fn check_local(config: &BestbyConfig) -> Status {
    if !config.models.is_available() {
        return Status::NotConfigured(format!(
            "model files not found in {}",
            config.models.model_dir.display()
        ));
    }

    match PureOcrEngine::from_config(&config.models) {
        Ok(_) => Status::Ok(format!("loaded from {}", config.models.model_dir.display())),
        Err(e) => Status::Failed(e.to_string()),
    }
}

/// Provider the service ends up using, given each provider's status.
///
/// `auto` never falls back to local models once Azure credentials are set.
fn selected_provider(kind: ProviderKind, azure: &Status, local: &Status) -> Option<&'static str> {
    let usable = |status: &Status| matches!(status, Status::Ok(_));
    match kind {
        ProviderKind::None => None,
        ProviderKind::Azure => usable(azure).then_some("azure"),
        ProviderKind::Local => usable(local).then_some("local"),
        ProviderKind::Auto => match azure {
            Status::NotConfigured(_) => usable(local).then_some("local"),
            _ => usable(azure).then_some("azure"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ok() -> Status {
        Status::Ok(String::new())
    }

    fn missing() -> Status {
        Status::NotConfigured(String::new())
    }

    fn failed() -> Status {
        Status::Failed(String::new())
    }

    #[test]
    fn test_auto_prefers_configured_azure() {
        assert_eq!(selected_provider(ProviderKind::Auto, &ok(), &ok()), Some("azure"));
        assert_eq!(selected_provider(ProviderKind::Auto, &missing(), &ok()), Some("local"));
        assert_eq!(selected_provider(ProviderKind::Auto, &failed(), &ok()), None);
        assert_eq!(selected_provider(ProviderKind::Auto, &missing(), &missing()), None);
    }

    #[test]
    fn test_explicit_provider_must_be_usable() {
        assert_eq!(selected_provider(ProviderKind::Azure, &ok(), &ok()), Some("azure"));
        assert_eq!(selected_provider(ProviderKind::Azure, &failed(), &ok()), None);
        assert_eq!(selected_provider(ProviderKind::Local, &ok(), &failed()), None);
        assert_eq!(selected_provider(ProviderKind::Local, &missing(), &ok()), Some("local"));
        assert_eq!(selected_provider(ProviderKind::None, &ok(), &ok()), None);
    }
}
