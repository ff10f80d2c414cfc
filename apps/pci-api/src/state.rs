use std::sync::Arc;

use pci_service::{ClinicalService, Providers};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ClinicalService>,
}
impl AppState {
	pub fn new(config: pci_config::Config) -> Self {
		Self::with_providers(config, Providers::default())
	}

	pub fn with_providers(config: pci_config::Config, providers: Providers) -> Self {
		Self { service: Arc::new(ClinicalService::with_providers(config, providers)) }
	}
}
