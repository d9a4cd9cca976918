//! The farmland registration wizard.
//!
//! Three steps: details, location, confirmation. Location fields are coupled:
//! picking a province clears the commune, and the full address is recomputed
//! from street, commune, and province on every change.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use validator::Validate;

use crate::api_client::ApiClient;
use crate::error::SubmitError;
use crate::models::{Farmland, FarmlandPayload, SoilType};
use crate::notify::{Notification, NotificationSink};
use crate::uploads::{stage_selection, ImageSet, SelectedFile};
use crate::wizard::{non_blank, FormWizard, StepDef, SubmitReceipt};

pub const STEP_DETAILS: usize = 0;
pub const STEP_LOCATION: usize = 1;
pub const STEP_CONFIRMATION: usize = 2;

/// Where the UI goes after a successful registration.
pub const FARMLANDS_ROUTE: &str = "/farmer/farmlands";

const REDIRECT_DELAY_MS: u64 = 1500;

/// Editable draft of a farmland. The location fields are private so every
/// change goes through the coupling rules.
#[derive(Debug, Clone, Default)]
pub struct FarmlandDraft {
    pub name: String,
    pub area_hectares: String,
    pub soil_type: Option<SoilType>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    province: String,
    commune: String,
    street_address: String,
    full_address: String,
}

impl FarmlandDraft {
    /// Selecting a province invalidates the dependent commune choice.
    pub fn set_province(&mut self, province: impl Into<String>) {
        self.province = province.into();
        self.commune.clear();
        self.recompute_full_address();
    }

    pub fn set_commune(&mut self, commune: impl Into<String>) {
        self.commune = commune.into();
        self.recompute_full_address();
    }

    pub fn set_street_address(&mut self, street: impl Into<String>) {
        self.street_address = street.into();
        self.recompute_full_address();
    }

    /// Coordinates arrive as a pair from the map picker.
    pub fn set_coordinates(&mut self, latitude: f64, longitude: f64) {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
    }

    pub fn province(&self) -> &str {
        &self.province
    }

    pub fn commune(&self) -> &str {
        &self.commune
    }

    pub fn street_address(&self) -> &str {
        &self.street_address
    }

    /// Derived display address: street, commune, province, skipping blanks.
    pub fn full_address(&self) -> &str {
        &self.full_address
    }

    fn recompute_full_address(&mut self) {
        let joined = [
            self.street_address.as_str(),
            self.commune.as_str(),
            self.province.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
        self.full_address = joined;
    }
}

/// Everything the farmland steps validate: the draft plus the photos.
#[derive(Debug, Clone, Default)]
pub struct FarmlandForm {
    pub draft: FarmlandDraft,
    pub images: ImageSet,
}

fn details_complete(form: &FarmlandForm) -> bool {
    !form.draft.name.trim().is_empty() && parse_area(&form.draft.area_hectares).is_some()
}

fn location_complete(form: &FarmlandForm) -> bool {
    !form.draft.province.trim().is_empty() && !form.draft.commune.trim().is_empty()
}

fn confirmation_complete(_form: &FarmlandForm) -> bool {
    true
}

/// Step definitions for the farmland wizard, in order.
pub fn farmland_steps() -> Vec<StepDef<FarmlandForm>> {
    vec![
        StepDef {
            key: "details",
            title: "Farmland details",
            is_complete: details_complete,
        },
        StepDef {
            key: "location",
            title: "Location & map",
            is_complete: location_complete,
        },
        StepDef {
            key: "confirmation",
            title: "Review & submit",
            is_complete: confirmation_complete,
        },
    ]
}

/// Drives a farmland registration to a persisted record.
pub struct FarmlandWizard {
    wizard: FormWizard<FarmlandForm>,
    api: Arc<ApiClient>,
    sink: Arc<dyn NotificationSink>,
    loading: bool,
    redirect_delay: Duration,
}

impl FarmlandWizard {
    pub fn create(api: Arc<ApiClient>, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_start_step(api, sink, STEP_DETAILS)
    }

    /// Starts on the location step, for entry points that open the map first.
    pub fn create_at_map_step(api: Arc<ApiClient>, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_start_step(api, sink, STEP_LOCATION)
    }

    fn with_start_step(
        api: Arc<ApiClient>,
        sink: Arc<dyn NotificationSink>,
        start_step: usize,
    ) -> Self {
        Self {
            wizard: FormWizard::with_start_step(
                FarmlandForm::default(),
                farmland_steps(),
                start_step,
            ),
            api,
            sink,
            loading: false,
            redirect_delay: Duration::from_millis(REDIRECT_DELAY_MS),
        }
    }

    /// Overrides the pause between the success notification and the redirect.
    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn form(&self) -> &FarmlandForm {
        self.wizard.state()
    }

    pub fn form_mut(&mut self) -> &mut FarmlandForm {
        self.wizard.state_mut()
    }

    pub fn step_index(&self) -> usize {
        self.wizard.step_index()
    }

    pub fn step_count(&self) -> usize {
        self.wizard.step_count()
    }

    pub fn can_continue(&self) -> bool {
        self.wizard.current_step_complete()
    }

    pub fn advance(&mut self) -> bool {
        self.wizard.advance()
    }

    pub fn retreat(&mut self) -> bool {
        self.wizard.retreat()
    }

    pub fn at_confirmation(&self) -> bool {
        self.wizard.is_terminal_step()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Screens picked photos into the staged set; photos are optional here,
    /// so rejects only notify and never block a step.
    pub fn select_photos(&mut self, files: Vec<SelectedFile>) {
        stage_selection(&mut self.wizard.state_mut().images, files, self.sink.as_ref());
    }

    pub fn remove_staged_photo(&mut self, index: usize) {
        self.wizard.state_mut().images.remove_staged(index);
    }

    /// Runs the staged submission: upload photos, assemble the payload, then
    /// register the farmland.
    pub async fn submit(&mut self) -> Result<SubmitReceipt<Farmland>, SubmitError> {
        if !self.wizard.is_terminal_step() {
            return Err(SubmitError::NotAtConfirmation {
                step_index: self.wizard.step_index(),
            });
        }
        if let Some(step_index) = self.wizard.first_incomplete_step() {
            return Err(SubmitError::IncompleteStep {
                step_index,
                step_key: self.wizard.steps()[step_index].key,
            });
        }

        self.loading = true;
        let result = self.run_submission().await;
        self.loading = false;

        match &result {
            Ok(receipt) => {
                info!(id = %receipt.record.id, "farmland registered");
                self.sink
                    .notify(Notification::success("Farmland registered."));
                tokio::time::sleep(self.redirect_delay).await;
            }
            Err(err) => {
                warn!(error = %err, "farmland registration failed");
                self.sink.notify(Notification::error(err.user_message()));
            }
        }
        result
    }

    async fn run_submission(&mut self) -> Result<SubmitReceipt<Farmland>, SubmitError> {
        let form = self.wizard.state();
        let image_urls = if form.images.has_staged() {
            let uploaded = self
                .api
                .upload_images(form.images.staged())
                .await
                .map_err(SubmitError::Upload)?;
            form.images.merged_urls(uploaded)
        } else {
            form.images.merged_urls(Vec::new())
        };

        let payload = assemble_payload(form, image_urls)?;
        payload.validate()?;

        let record = self.api.create_farmland(&payload).await?;
        Ok(SubmitReceipt {
            record,
            redirect_to: FARMLANDS_ROUTE,
        })
    }
}

fn assemble_payload(
    form: &FarmlandForm,
    images: Vec<String>,
) -> Result<FarmlandPayload, SubmitError> {
    let draft = &form.draft;
    let Some(area_hectares) = parse_area(&draft.area_hectares) else {
        return Err(SubmitError::IncompleteStep {
            step_index: STEP_DETAILS,
            step_key: "details",
        });
    };

    Ok(FarmlandPayload {
        name: draft.name.trim().to_string(),
        area_hectares,
        province: draft.province.trim().to_string(),
        commune: draft.commune.trim().to_string(),
        street_address: non_blank(&draft.street_address),
        full_address: draft.full_address.clone(),
        latitude: draft.latitude,
        longitude: draft.longitude,
        soil_type: draft.soil_type,
        images,
    })
}

/// Area in hectares, accepted only when it parses to a positive number.
fn parse_area(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|area| area.is_finite() && *area > 0.0)
}
