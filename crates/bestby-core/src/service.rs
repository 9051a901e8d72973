//! High-level service: image bytes in, expiry date out.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::expiry::ExpiryDateParser;
use crate::models::config::{BestbyConfig, ProviderKind};
use crate::models::expiry::ExtractionResult;
use crate::ocr::{ImagePreprocessor, OcrProvider};

/// Combines an OCR provider, optional preprocessing and the date parser.
///
/// Without a provider every extraction is absent; nothing here returns an
/// error to the caller.
pub struct DateOcrService {
    provider: Option<Box<dyn OcrProvider>>,
    preprocessor: Option<ImagePreprocessor>,
    parser: ExpiryDateParser,
}

impl DateOcrService {
    /// Build the service, choosing a provider from configuration.
    pub fn from_config(config: &BestbyConfig) -> Self {
        let provider = select_provider(config);
        match &provider {
            Some(p) => info!("Using OCR provider: {}", p.name()),
            None => warn!("No OCR provider available; image extraction will return no date"),
        }

        Self {
            provider,
            preprocessor: config
                .preprocessing
                .enabled
                .then(|| ImagePreprocessor::from_config(&config.preprocessing)),
            parser: ExpiryDateParser::from_config(&config.extraction),
        }
    }

    /// Build the service around an explicit provider.
    pub fn with_provider(provider: Box<dyn OcrProvider>) -> Self {
        Self {
            provider: Some(provider),
            preprocessor: None,
            parser: ExpiryDateParser::default(),
        }
    }

    /// Build a service without OCR.
    pub fn unavailable() -> Self {
        Self {
            provider: None,
            preprocessor: None,
            parser: ExpiryDateParser::default(),
        }
    }

    /// Enable or replace image preprocessing.
    pub fn with_preprocessor(mut self, preprocessor: Option<ImagePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Replace the date parser.
    pub fn with_parser(mut self, parser: ExpiryDateParser) -> Self {
        self.parser = parser;
        self
    }

    /// Whether an OCR provider is configured.
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Name of the active provider, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    /// The date parser in use.
    pub fn parser(&self) -> &ExpiryDateParser {
        &self.parser
    }

    /// Run preprocessing and OCR. Failures yield zero lines.
    pub fn recognize(&self, image: &[u8]) -> Vec<String> {
        let Some(provider) = self.provider.as_deref() else {
            debug!("OCR requested but no provider is configured");
            return Vec::new();
        };

        let start = Instant::now();
        let prepared;
        let input = match &self.preprocessor {
            Some(preprocessor) => {
                prepared = preprocessor.preprocess(image);
                prepared.as_slice()
            }
            None => image,
        };

        match provider.recognize(input) {
            Ok(lines) => {
                debug!(
                    "{} returned {} lines in {}ms",
                    provider.name(),
                    lines.len(),
                    start.elapsed().as_millis()
                );
                lines
            }
            Err(e) => {
                warn!("OCR with {} failed: {}", provider.name(), e);
                Vec::new()
            }
        }
    }

    /// Recognize text and extract the expiry date with details.
    pub fn extract(&self, image: &[u8]) -> ExtractionResult {
        let lines = self.recognize(image);
        self.parser.parse(&lines)
    }

    /// Recognize text and return the expiry date as `YYYY-MM-DD`.
    pub fn extract_date(&self, image: &[u8]) -> Option<String> {
        self.extract(image).iso_date()
    }
}

fn select_provider(config: &BestbyConfig) -> Option<Box<dyn OcrProvider>> {
    match config.ocr.provider {
        ProviderKind::None => None,
        ProviderKind::Azure => azure_provider(config),
        ProviderKind::Local => local_provider(config),
        ProviderKind::Auto => {
            if config.azure.is_configured() {
                azure_provider(config)
            } else if config.models.is_available() {
                local_provider(config)
            } else {
                None
            }
        }
    }
}

#[cfg(feature = "azure")]
fn azure_provider(config: &BestbyConfig) -> Option<Box<dyn OcrProvider>> {
    match crate::ocr::AzureOcrClient::from_config(&config.azure, config.ocr.timeout_secs) {
        Ok(client) => Some(Box::new(client)),
        Err(e) => {
            warn!("Azure OCR unavailable: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "azure"))]
fn azure_provider(_config: &BestbyConfig) -> Option<Box<dyn OcrProvider>> {
    warn!("Azure OCR requested but this build has no `azure` feature");
    None
}

#[cfg(feature = "native")]
fn local_provider(config: &BestbyConfig) -> Option<Box<dyn OcrProvider>> {
    match crate::ocr::PureOcrEngine::from_config(&config.models) {
        Ok(engine) => Some(Box::new(engine)),
        Err(e) => {
            warn!("Local OCR unavailable: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "native"))]
fn local_provider(_config: &BestbyConfig) -> Option<Box<dyn OcrProvider>> {
    warn!("Local OCR requested but this build has no `native` feature");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::models::expiry::{MatchMethod, PatternKind};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Returns canned lines and records the bytes it was given.
    struct FakeOcr {
        lines: Vec<&'static str>,
        seen: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl FakeOcr {
        fn new(lines: Vec<&'static str>) -> Self {
            Self {
                lines,
                seen: Rc::default(),
            }
        }
    }

    impl OcrProvider for FakeOcr {
        fn name(&self) -> &str {
            "fake"
        }

        fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError> {
            self.seen.borrow_mut().push(image.to_vec());
            Ok(self.lines.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FailingOcr;

    impl OcrProvider for FailingOcr {
        fn name(&self) -> &str {
            "failing"
        }

        fn recognize(&self, _image: &[u8]) -> Result<Vec<String>, OcrError> {
            Err(OcrError::Auth(401))
        }
    }

    #[test]
    fn test_extract_date() {
        let service = DateOcrService::with_provider(Box::new(FakeOcr::new(vec![
            "NET WT 500g",
            "EXP 02/2024",
        ])));

        assert!(service.is_available());
        assert_eq!(service.provider_name(), Some("fake"));
        assert_eq!(service.extract_date(b"img"), Some("2024-02-29".to_string()));
    }

    #[test]
    fn test_extract_details() {
        let service = DateOcrService::with_provider(Box::new(FakeOcr::new(vec![
            "BEST BEFORE",
            "DEC 25, 2024",
        ])));

        let result = service.extract(b"img");
        let found = result.expiry.unwrap();
        assert_eq!(found.keyword.as_deref(), Some("best before"));
        assert_eq!(found.method, MatchMethod::Pattern(PatternKind::MonthName));
        assert_eq!(result.line_count, 2);
    }

    #[test]
    fn test_provider_failure_is_absent() {
        let service = DateOcrService::with_provider(Box::new(FailingOcr));
        assert!(service.recognize(b"img").is_empty());
        assert_eq!(service.extract_date(b"img"), None);
    }

    #[test]
    fn test_unavailable_service() {
        let service = DateOcrService::unavailable();
        assert!(!service.is_available());
        assert_eq!(service.provider_name(), None);
        assert_eq!(service.extract_date(b"img"), None);
    }

    #[test]
    fn test_provider_none_from_config() {
        let mut config = BestbyConfig::default();
        config.ocr.provider = ProviderKind::None;
        assert!(!DateOcrService::from_config(&config).is_available());
    }

    #[test]
    fn test_auto_without_credentials_or_models() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BestbyConfig::default();
        config.models.model_dir = dir.path().to_path_buf();

        let service = DateOcrService::from_config(&config);
        assert!(!service.is_available());
    }

    #[test]
    fn test_preprocessing_falls_back_to_original_bytes() {
        let fake = FakeOcr::new(vec!["USE BY 31122024"]);
        let seen = Rc::clone(&fake.seen);
        let service = DateOcrService::with_provider(Box::new(fake))
            .with_preprocessor(Some(ImagePreprocessor::new()));

        // Not a decodable image, so the provider sees the input unchanged
        assert_eq!(service.extract_date(b"raw"), Some("2024-12-31".to_string()));
        assert_eq!(seen.borrow().as_slice(), &[b"raw".to_vec()]);
    }

    #[test]
    fn test_parser_settings_apply() {
        let service = DateOcrService::with_provider(Box::new(FakeOcr::new(vec!["lot 12.08.2026"])))
            .with_parser(ExpiryDateParser::new().with_whole_text_fallback(false));
        assert_eq!(service.extract_date(b"img"), None);
    }
}
