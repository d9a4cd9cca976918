//! The funding-request wizard.
//!
//! Four steps: basics, financials, risk & collateral, confirmation. The same
//! wizard backs creation and editing; edit mode hydrates the draft from the
//! persisted record and submits with PATCH instead of POST.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api_client::ApiClient;
use crate::error::{ApiError, SubmitError};
use crate::models::{
    Farmland, FarmerInvestment, InvestmentPayload, InvestmentType, RiskLevel,
    MIN_REQUESTED_AMOUNT,
};
use crate::notify::{Notification, NotificationSink};
use crate::uploads::{stage_selection, ImageSet, SelectedFile};
use crate::wizard::{non_blank, AmountField, FormWizard, StepDef, SubmitReceipt};

pub const STEP_BASICS: usize = 0;
pub const STEP_FINANCIALS: usize = 1;
pub const STEP_COLLATERAL: usize = 2;
pub const STEP_CONFIRMATION: usize = 3;

/// Where the UI goes after a successful save.
pub const INVESTMENTS_ROUTE: &str = "/farmer/investments";

const REDIRECT_DELAY_MS: u64 = 1500;

/// Editable draft of a funding request. Numeric and date fields hold the
/// user's text so partial input survives step changes.
#[derive(Debug, Clone, Default)]
pub struct InvestmentDraft {
    pub title: String,
    pub description: String,
    pub investment_type: Option<InvestmentType>,
    pub farmland_id: Option<Uuid>,
    pub requested_amount: AmountField,
    pub minimum_investment: AmountField,
    pub maximum_investment: AmountField,
    pub expected_return_rate: String,
    pub duration_months: String,
    pub target_date: String,
    pub funding_deadline: String,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub collateral: String,
    pub insurance: String,
    pub repayment_terms: String,
}

impl InvestmentDraft {
    /// Rebuilds the editable draft from a persisted record.
    pub fn hydrate(record: &FarmerInvestment) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone().unwrap_or_default(),
            investment_type: Some(record.investment_type),
            farmland_id: record.farmland_id,
            requested_amount: AmountField::from_value(record.requested_amount),
            minimum_investment: record
                .minimum_investment
                .map(AmountField::from_value)
                .unwrap_or_default(),
            maximum_investment: record
                .maximum_investment
                .map(AmountField::from_value)
                .unwrap_or_default(),
            expected_return_rate: record
                .expected_return_rate
                .map(|rate| rate.to_string())
                .unwrap_or_default(),
            duration_months: record
                .duration_months
                .map(|months| months.to_string())
                .unwrap_or_default(),
            target_date: record.target_date.map(input_date).unwrap_or_default(),
            funding_deadline: record.funding_deadline.map(input_date).unwrap_or_default(),
            risk_level: record.risk_level,
            risk_factors: record.risk_factors.clone(),
            collateral: record.collateral.clone(),
            insurance: record.insurance.clone().unwrap_or_default(),
            repayment_terms: record.repayment_terms.clone().unwrap_or_default(),
        }
    }

    /// Appends a risk factor, ignoring blank input.
    pub fn add_risk_factor(&mut self, factor: impl Into<String>) {
        if let Some(factor) = non_blank(&factor.into()) {
            self.risk_factors.push(factor);
        }
    }

    pub fn remove_risk_factor(&mut self, index: usize) {
        if index < self.risk_factors.len() {
            self.risk_factors.remove(index);
        }
    }
}

/// Everything the funding-request steps validate: the draft plus the images.
#[derive(Debug, Clone, Default)]
pub struct InvestmentForm {
    pub draft: InvestmentDraft,
    pub images: ImageSet,
}

// ===== Step completeness checks =====
// Pure reads over the form; absent or unparseable values read as incomplete.

fn basics_complete(form: &InvestmentForm) -> bool {
    let draft = &form.draft;
    if draft.title.trim().is_empty() {
        return false;
    }
    match draft.investment_type {
        None => false,
        Some(kind) => !kind.requires_farmland() || draft.farmland_id.is_some(),
    }
}

fn financials_complete(form: &InvestmentForm) -> bool {
    let draft = &form.draft;
    let Some(requested) = draft.requested_amount.value() else {
        return false;
    };
    if requested < MIN_REQUESTED_AMOUNT {
        return false;
    }
    let minimum = draft.minimum_investment.value();
    let maximum = draft.maximum_investment.value();
    if let (Some(min), Some(max)) = (minimum, maximum) {
        if min > max {
            return false;
        }
    }
    if let Some(max) = maximum {
        if max > requested {
            return false;
        }
    }
    true
}

fn collateral_complete(form: &InvestmentForm) -> bool {
    !form.draft.collateral.trim().is_empty() && form.images.total_count() >= 1
}

fn confirmation_complete(_form: &InvestmentForm) -> bool {
    true
}

/// Step definitions for the funding-request wizard, in order.
pub fn investment_steps() -> Vec<StepDef<InvestmentForm>> {
    vec![
        StepDef {
            key: "basics",
            title: "Basic information",
            is_complete: basics_complete,
        },
        StepDef {
            key: "financials",
            title: "Funding details",
            is_complete: financials_complete,
        },
        StepDef {
            key: "collateral",
            title: "Risk & collateral",
            is_complete: collateral_complete,
        },
        StepDef {
            key: "confirmation",
            title: "Review & submit",
            is_complete: confirmation_complete,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WizardMode {
    Create,
    Edit(Uuid),
}

/// Drives a funding request from first field to persisted record.
pub struct InvestmentWizard {
    wizard: FormWizard<InvestmentForm>,
    mode: WizardMode,
    api: Arc<ApiClient>,
    sink: Arc<dyn NotificationSink>,
    farmlands: Vec<Farmland>,
    loading: bool,
    redirect_delay: Duration,
}

impl InvestmentWizard {
    /// Fresh wizard for a new funding request.
    pub fn create(api: Arc<ApiClient>, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_form(api, sink, InvestmentForm::default(), WizardMode::Create)
    }

    /// Wizard hydrated from a persisted record for editing.
    pub async fn edit(
        api: Arc<ApiClient>,
        sink: Arc<dyn NotificationSink>,
        id: Uuid,
    ) -> Result<Self, ApiError> {
        let record = api.get_investment(id).await?;
        let form = InvestmentForm {
            draft: InvestmentDraft::hydrate(&record),
            images: ImageSet::from_existing(record.images.clone()),
        };
        Ok(Self::with_form(api, sink, form, WizardMode::Edit(id)))
    }

    fn with_form(
        api: Arc<ApiClient>,
        sink: Arc<dyn NotificationSink>,
        form: InvestmentForm,
        mode: WizardMode,
    ) -> Self {
        Self {
            wizard: FormWizard::new(form, investment_steps()),
            mode,
            api,
            sink,
            farmlands: Vec::new(),
            loading: false,
            redirect_delay: Duration::from_millis(REDIRECT_DELAY_MS),
        }
    }

    /// Overrides the pause between the success notification and the redirect.
    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn form(&self) -> &InvestmentForm {
        self.wizard.state()
    }

    pub fn form_mut(&mut self) -> &mut InvestmentForm {
        self.wizard.state_mut()
    }

    pub fn steps(&self) -> &[StepDef<InvestmentForm>] {
        self.wizard.steps()
    }

    pub fn step_index(&self) -> usize {
        self.wizard.step_index()
    }

    pub fn step_count(&self) -> usize {
        self.wizard.step_count()
    }

    /// Whether the Continue control should be enabled.
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

    pub fn is_edit_mode(&self) -> bool {
        matches!(self.mode, WizardMode::Edit(_))
    }

    /// Whether a backend call is in flight; drives spinners and disabled
    /// submit controls.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Screens picked files into the staged set. Each reject surfaces as its
    /// own error notification; accepted files are unaffected.
    pub fn select_images(&mut self, files: Vec<SelectedFile>) {
        stage_selection(&mut self.wizard.state_mut().images, files, self.sink.as_ref());
    }

    pub fn remove_staged_image(&mut self, index: usize) {
        self.wizard.state_mut().images.remove_staged(index);
    }

    pub fn remove_existing_image(&mut self, index: usize) {
        self.wizard.state_mut().images.remove_existing(index);
    }

    /// Loads the farmland options shown for farmland-scoped types. A failure
    /// keeps the current options and notifies.
    pub async fn load_farmlands(&mut self) -> &[Farmland] {
        self.loading = true;
        match self.api.list_farmlands().await {
            Ok(farmlands) => {
                self.farmlands = farmlands;
            }
            Err(err) => {
                warn!(error = %err, "failed to load farmland options");
                self.sink.notify(Notification::error(
                    "Could not load your farmlands. Please try again.",
                ));
            }
        }
        self.loading = false;
        &self.farmlands
    }

    pub fn farmland_options(&self) -> &[Farmland] {
        &self.farmlands
    }

    /// Runs the staged submission: upload images, assemble the payload, then
    /// create or update the record. Only callable from the confirmation step
    /// with every prior step complete; on success the wizard notifies, waits
    /// out the redirect delay, and hands back the record plus target route.
    ///
    /// The mutable borrow makes overlapping submissions unrepresentable;
    /// [`is_loading`](Self::is_loading) drives the disabled state meanwhile.
    pub async fn submit(&mut self) -> Result<SubmitReceipt<FarmerInvestment>, SubmitError> {
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
                info!(id = %receipt.record.id, "funding request saved");
                let message = if self.is_edit_mode() {
                    "Funding request updated."
                } else {
                    "Funding request published."
                };
                self.sink.notify(Notification::success(message));
                tokio::time::sleep(self.redirect_delay).await;
            }
            Err(err) => {
                warn!(error = %err, "funding request submission failed");
                self.sink.notify(Notification::error(err.user_message()));
            }
        }
        result
    }

    async fn run_submission(&mut self) -> Result<SubmitReceipt<FarmerInvestment>, SubmitError> {
        let form = self.wizard.state();
        // The upload batch settles completely before any record is written;
        // a failed batch leaves the staged files for a later retry.
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

        let record = match self.mode {
            WizardMode::Create => self.api.create_investment(&payload).await?,
            WizardMode::Edit(id) => self.api.update_investment(id, &payload).await?,
        };
        Ok(SubmitReceipt {
            record,
            redirect_to: INVESTMENTS_ROUTE,
        })
    }
}

/// Builds the wire payload from the form: blank optionals become absent,
/// numeric text is parsed, risk factors are trimmed with empties dropped.
fn assemble_payload(
    form: &InvestmentForm,
    images: Vec<String>,
) -> Result<InvestmentPayload, SubmitError> {
    let draft = &form.draft;
    let Some(investment_type) = draft.investment_type else {
        return Err(SubmitError::IncompleteStep {
            step_index: STEP_BASICS,
            step_key: "basics",
        });
    };
    let Some(requested_amount) = draft.requested_amount.value() else {
        return Err(SubmitError::IncompleteStep {
            step_index: STEP_FINANCIALS,
            step_key: "financials",
        });
    };

    Ok(InvestmentPayload {
        title: draft.title.trim().to_string(),
        description: non_blank(&draft.description),
        investment_type,
        // A farmland picked for an earlier choice of type is not sent once
        // the type no longer scopes to farmlands.
        farmland_id: if investment_type.requires_farmland() {
            draft.farmland_id
        } else {
            None
        },
        requested_amount,
        minimum_investment: draft.minimum_investment.value(),
        maximum_investment: draft.maximum_investment.value(),
        expected_return_rate: parse_rate(&draft.expected_return_rate),
        duration_months: parse_months(&draft.duration_months),
        target_date: parse_input_date(&draft.target_date),
        funding_deadline: parse_input_date(&draft.funding_deadline),
        risk_level: draft.risk_level,
        risk_factors: draft
            .risk_factors
            .iter()
            .filter_map(|factor| non_blank(factor))
            .collect(),
        collateral: draft.collateral.trim().to_string(),
        images,
        insurance: non_blank(&draft.insurance),
        repayment_terms: non_blank(&draft.repayment_terms),
    })
}

fn input_date(timestamp: DateTime<Utc>) -> String {
    timestamp.date_naive().format("%Y-%m-%d").to_string()
}

fn parse_input_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_rate(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|rate| rate.is_finite() && *rate >= 0.0)
}

fn parse_months(value: &str) -> Option<i32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i32>().ok().filter(|months| *months > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvestmentStatus;
    use chrono::TimeZone;

    fn mk_form() -> InvestmentForm {
        InvestmentForm::default()
    }

    fn mk_record() -> FarmerInvestment {
        FarmerInvestment {
            id: Uuid::new_v4(),
            title: "Dự án A".to_string(),
            description: Some("Mở rộng vùng trồng".to_string()),
            investment_type: InvestmentType::CropFunding,
            farmland_id: Some(Uuid::new_v4()),
            requested_amount: 5_000_000,
            minimum_investment: Some(500_000),
            maximum_investment: Some(2_000_000),
            expected_return_rate: Some(12.5),
            duration_months: Some(18),
            target_date: Some(Utc.with_ymd_and_hms(2026, 9, 1, 7, 30, 0).unwrap()),
            funding_deadline: None,
            risk_level: RiskLevel::High,
            risk_factors: vec!["hạn hán".to_string(), "sâu bệnh".to_string()],
            collateral: "Máy kéo".to_string(),
            images: vec!["https://cdn.agrifund.test/a.jpg".to_string()],
            insurance: None,
            repayment_terms: Some("Trả theo quý".to_string()),
            status: InvestmentStatus::PendingApproval,
            funded_amount: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn basics_needs_title_and_type() {
        let mut form = mk_form();
        assert!(!basics_complete(&form));

        form.draft.title = "Dự án A".to_string();
        assert!(!basics_complete(&form));

        form.draft.investment_type = Some(InvestmentType::EquipmentPurchase);
        assert!(basics_complete(&form));

        form.draft.title = "   ".to_string();
        assert!(!basics_complete(&form));
    }

    #[test]
    fn farmland_scoped_type_needs_a_farmland() {
        let mut form = mk_form();
        form.draft.title = "Vụ lúa hè thu".to_string();
        form.draft.investment_type = Some(InvestmentType::CropFunding);
        assert!(!basics_complete(&form));

        form.draft.farmland_id = Some(Uuid::new_v4());
        assert!(basics_complete(&form));
    }

    #[test]
    fn financials_threshold_is_exactly_one_million() {
        let mut form = mk_form();
        form.draft.requested_amount.set("999999");
        assert!(!financials_complete(&form));

        form.draft.requested_amount.set("1000000");
        assert!(financials_complete(&form));
    }

    #[test]
    fn empty_amount_reads_as_incomplete() {
        let form = mk_form();
        assert!(!financials_complete(&form));
    }

    #[test]
    fn investor_bounds_must_be_ordered_and_capped() {
        let mut form = mk_form();
        form.draft.requested_amount.set("2000000");
        form.draft.minimum_investment.set("500000");
        form.draft.maximum_investment.set("100000");
        assert!(!financials_complete(&form));

        form.draft.maximum_investment.set("900000");
        assert!(financials_complete(&form));

        form.draft.maximum_investment.set("3000000");
        assert!(!financials_complete(&form));
    }

    #[test]
    fn collateral_needs_text_and_an_image() {
        let mut form = mk_form();
        form.draft.collateral = "Máy kéo".to_string();
        assert!(!collateral_complete(&form));

        form.images = ImageSet::from_existing(vec!["https://cdn.agrifund.test/a.jpg".to_string()]);
        assert!(collateral_complete(&form));
    }

    #[test]
    fn hydrate_renders_numbers_and_dates_as_input_text() {
        let record = mk_record();
        let draft = InvestmentDraft::hydrate(&record);

        assert_eq!(draft.title, "Dự án A");
        assert_eq!(draft.requested_amount.display(), "5,000,000");
        assert_eq!(draft.minimum_investment.raw(), "500000");
        assert_eq!(draft.expected_return_rate, "12.5");
        assert_eq!(draft.duration_months, "18");
        assert_eq!(draft.target_date, "2026-09-01");
        assert_eq!(draft.funding_deadline, "");
        assert_eq!(draft.risk_factors, ["hạn hán", "sâu bệnh"]);
        assert_eq!(draft.insurance, "");
    }

    #[test]
    fn hydrated_form_passes_every_gated_step() {
        let record = mk_record();
        let form = InvestmentForm {
            draft: InvestmentDraft::hydrate(&record),
            images: ImageSet::from_existing(record.images.clone()),
        };
        assert!(basics_complete(&form));
        assert!(financials_complete(&form));
        assert!(collateral_complete(&form));
    }

    #[test]
    fn assemble_omits_blank_optionals_and_trims() {
        let mut form = mk_form();
        form.draft.title = "  Dự án A  ".to_string();
        form.draft.investment_type = Some(InvestmentType::EquipmentPurchase);
        form.draft.requested_amount.set("2000000");
        form.draft.collateral = "Máy kéo".to_string();
        form.draft.description = "   ".to_string();
        form.draft.expected_return_rate = "abc".to_string();
        form.draft.duration_months = "-3".to_string();
        form.draft.target_date = "31/12/2026".to_string();
        form.draft.risk_factors = vec!["  hạn hán ".to_string(), "  ".to_string()];

        let payload = assemble_payload(&form, vec!["https://cdn.agrifund.test/a.jpg".to_string()])
            .expect("payload");

        assert_eq!(payload.title, "Dự án A");
        assert_eq!(payload.description, None);
        assert_eq!(payload.expected_return_rate, None);
        assert_eq!(payload.duration_months, None);
        assert_eq!(payload.target_date, None);
        assert_eq!(payload.risk_factors, ["hạn hán"]);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn assemble_drops_farmland_for_unscoped_types() {
        let mut form = mk_form();
        form.draft.title = "Mua máy sấy".to_string();
        form.draft.investment_type = Some(InvestmentType::EquipmentPurchase);
        form.draft.farmland_id = Some(Uuid::new_v4());
        form.draft.requested_amount.set("2000000");
        form.draft.collateral = "Nhà kho".to_string();

        let payload = assemble_payload(&form, vec!["https://cdn.agrifund.test/a.jpg".to_string()])
            .expect("payload");
        assert_eq!(payload.farmland_id, None);
    }

    #[test]
    fn assemble_parses_dates_in_input_format() {
        let mut form = mk_form();
        form.draft.title = "Dự án A".to_string();
        form.draft.investment_type = Some(InvestmentType::Expansion);
        form.draft.requested_amount.set("1500000");
        form.draft.collateral = "Kho lạnh".to_string();
        form.draft.target_date = "2026-09-01".to_string();

        let payload = assemble_payload(&form, vec!["https://cdn.agrifund.test/a.jpg".to_string()])
            .expect("payload");
        assert_eq!(
            payload.target_date,
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
    }
}
