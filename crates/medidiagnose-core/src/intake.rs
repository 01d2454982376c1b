//! Intake flow: image, then symptoms, then result.
//!
//! The flow is strictly linear. Only [`IntakeFlow::reset`] and
//! [`IntakeFlow::remove_image`] go back to the image step, and both clear
//! everything entered after it. Each submission carries a ticket; results for a ticket that is
//! no longer in flight are dropped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    sanitize_text, AnalysisSummary, ImageQuality, ImageUpload, Outcome, Session, SymptomInput,
};
use crate::report::{Report, ReportGenerator, ReportResult};
use crate::symptoms::SymptomVocabulary;

/// Image types accepted at upload time.
pub const INTAKE_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/heic", "image/heif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeStep {
    Image,
    Symptoms,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub message: String,
}

impl Notice {
    pub fn new(severity: NoticeSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Intake errors. Display strings are the messages shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Please upload a valid image file (JPG, PNG, or HEIC)")]
    InvalidImageType,

    #[error("Image size exceeds {max_mb}MB limit")]
    ImageTooLarge { max_mb: u64 },

    #[error("Please upload an image before submitting.")]
    MissingImage,

    #[error("Please select at least one symptom before submitting.")]
    MissingSymptoms,

    #[error("Please describe your problem before submitting.")]
    MissingDescription,

    #[error("Unknown symptom: {0}")]
    UnknownSymptom(String),

    #[error("Cannot advance from the {0:?} step")]
    CannotAdvance(IntakeStep),

    #[error("A submission is already in progress")]
    SubmissionInFlight,
}

pub type IntakeResult<T> = Result<T, IntakeError>;

/// Identifies one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionTicket(u64);

/// What a submission needs, captured at submit time.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub ticket: SubmissionTicket,
    pub image: ImageUpload,
    pub input: SymptomInput,
}

/// State of one intake session.
#[derive(Debug)]
pub struct IntakeFlow {
    step: IntakeStep,
    image: Option<ImageUpload>,
    image_quality: Option<ImageQuality>,
    selected: Vec<String>,
    description: String,
    result: Option<Outcome<AnalysisSummary>>,
    notice: Option<Notice>,
    in_flight: Option<SubmissionTicket>,
    next_ticket: u64,
    max_upload_bytes: u64,
    vocabulary: SymptomVocabulary,
}

impl IntakeFlow {
    pub fn new(max_upload_bytes: u64) -> Self {
        Self::with_vocabulary(max_upload_bytes, SymptomVocabulary::default())
    }

    pub fn with_vocabulary(max_upload_bytes: u64, vocabulary: SymptomVocabulary) -> Self {
        Self {
            step: IntakeStep::Image,
            image: None,
            image_quality: None,
            selected: Vec::new(),
            description: String::new(),
            result: None,
            notice: None,
            in_flight: None,
            next_ticket: 0,
            max_upload_bytes,
            vocabulary,
        }
    }

    /// Accept an image if its type and size are allowed.
    pub fn attach_image(&mut self, image: ImageUpload) -> IntakeResult<()> {
        if !INTAKE_IMAGE_TYPES.contains(&image.mime_type.as_str()) {
            return Err(self.reject(IntakeError::InvalidImageType));
        }
        if image.size() > self.max_upload_bytes {
            let max_mb = self.max_upload_bytes / (1024 * 1024);
            return Err(self.reject(IntakeError::ImageTooLarge { max_mb }));
        }

        self.image_quality = image
            .dimensions()
            .map(|(width, height)| ImageQuality::from_dimensions(width, height));
        tracing::debug!(
            file = %image.file_name,
            bytes = image.size(),
            quality = ?self.image_quality,
            "Image attached"
        );
        self.image = Some(image);
        Ok(())
    }

    /// Drop the image together with everything entered after it and return
    /// to the image step.
    pub fn remove_image(&mut self) {
        self.step = IntakeStep::Image;
        self.image = None;
        self.image_quality = None;
        self.selected.clear();
        self.description.clear();
        self.result = None;
        self.in_flight = None;
    }

    /// Toggle a checklist entry. Returns whether it is now selected.
    pub fn toggle_symptom(&mut self, label: &str) -> IntakeResult<bool> {
        let entry = self
            .vocabulary
            .canonicalize(label)
            .ok_or_else(|| IntakeError::UnknownSymptom(label.to_string()))?
            .to_string();

        if let Some(pos) = self.selected.iter().position(|s| *s == entry) {
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(entry);
            Ok(true)
        }
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
    }

    /// Whether [`IntakeFlow::advance`] would succeed.
    pub fn can_advance(&self) -> bool {
        match self.step {
            IntakeStep::Image => self.image.is_some() || !self.description.trim().is_empty(),
            IntakeStep::Symptoms => self.check_submission().is_ok(),
            IntakeStep::Result => false,
        }
    }

    /// Move from the image step to the symptom step.
    ///
    /// The symptom step is left only through a successful submission.
    pub fn advance(&mut self) -> IntakeResult<IntakeStep> {
        match self.step {
            IntakeStep::Image if self.can_advance() => {
                self.step = IntakeStep::Symptoms;
                Ok(self.step)
            }
            step => Err(IntakeError::CannotAdvance(step)),
        }
    }

    /// Validate the inputs and hand out a ticket for one submission.
    ///
    /// Image, at least one symptom and a description that is non-empty after
    /// sanitizing are all required here, whatever the step gating allowed.
    pub fn begin_submission(&mut self) -> IntakeResult<SubmissionRequest> {
        if self.in_flight.is_some() {
            return Err(IntakeError::SubmissionInFlight);
        }
        if self.step != IntakeStep::Symptoms {
            return Err(IntakeError::CannotAdvance(self.step));
        }
        if let Err(e) = self.check_submission() {
            return Err(self.reject(e));
        }
        let image = self.image.clone().ok_or(IntakeError::MissingImage)?;

        self.next_ticket += 1;
        let ticket = SubmissionTicket(self.next_ticket);
        self.in_flight = Some(ticket);
        self.notice = None;

        let input = SymptomInput::new(
            self.selected.iter().map(|s| sanitize_text(s)),
            sanitize_text(&self.description),
        );
        tracing::info!(
            symptoms = input.selected_symptoms.len(),
            image_bytes = image.size(),
            "Submission started"
        );

        Ok(SubmissionRequest {
            ticket,
            image,
            input,
        })
    }

    /// Apply the outcome of a submission. Returns false if it was stale.
    ///
    /// A failure keeps the flow on the symptom step so the user can retry.
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Outcome<AnalysisSummary>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            tracing::debug!(?ticket, "Discarding stale submission result");
            return false;
        }
        self.in_flight = None;

        match &outcome {
            Outcome::Success { data } => {
                self.step = IntakeStep::Result;
                self.notice = Some(Notice::new(
                    NoticeSeverity::Success,
                    "Image and symptoms successfully sent for analysis!",
                ));
                tracing::info!(diagnosis = %data.diagnosis, "Submission completed");
            }
            Outcome::Failure { reason } => {
                self.notice = Some(Notice::new(
                    NoticeSeverity::Error,
                    "Failed to send data for analysis. Please try again.",
                ));
                tracing::warn!(reason = %reason, "Submission failed");
            }
        }
        self.result = Some(outcome);
        true
    }

    /// Back to an empty image step. Any in-flight submission becomes stale.
    pub fn reset(&mut self) {
        self.remove_image();
        self.notice = None;
    }

    /// Report for the current successful result.
    pub fn generate_report(
        &mut self,
        generator: &ReportGenerator,
        session: &Session,
    ) -> ReportResult<Report> {
        let outcome = generator.generate(
            self.summary(),
            session,
            &self.selected,
            &self.description,
        );
        self.notice = Some(match &outcome {
            Ok(_) => Notice::new(NoticeSeverity::Success, "Medical report downloaded successfully!"),
            Err(crate::report::ReportError::NotSignedIn) => {
                Notice::new(NoticeSeverity::Warning, "Please log in to generate a personalized report.")
            }
            Err(crate::report::ReportError::MissingResult) => {
                Notice::new(NoticeSeverity::Error, "No diagnosis available to generate a report.")
            }
            Err(_) => Notice::new(NoticeSeverity::Error, "Failed to generate report. Please try again."),
        });
        outcome
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    /// Quality grade of the attached image, when its dimensions are readable.
    pub fn image_quality(&self) -> Option<ImageQuality> {
        self.image_quality
    }

    pub fn selected_symptoms(&self) -> &[String] {
        &self.selected
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn result(&self) -> Option<&Outcome<AnalysisSummary>> {
        self.result.as_ref()
    }

    /// The successful result, if any.
    pub fn summary(&self) -> Option<&AnalysisSummary> {
        self.result.as_ref().and_then(Outcome::data)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    fn check_submission(&self) -> IntakeResult<()> {
        if self.image.is_none() {
            return Err(IntakeError::MissingImage);
        }
        if self.selected.is_empty() {
            return Err(IntakeError::MissingSymptoms);
        }
        if sanitize_text(&self.description).trim().is_empty() {
            return Err(IntakeError::MissingDescription);
        }
        Ok(())
    }

    fn reject(&mut self, error: IntakeError) -> IntakeError {
        self.notice = Some(Notice::new(NoticeSeverity::Error, error.to_string()));
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_MIB: u64 = 10 * 1024 * 1024;

    fn photo() -> ImageUpload {
        ImageUpload::new("arm.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    fn summary() -> AnalysisSummary {
        AnalysisSummary {
            diagnosis: "Dermatitis".into(),
            ..Default::default()
        }
    }

    fn ready_flow() -> IntakeFlow {
        let mut flow = IntakeFlow::new(TEN_MIB);
        flow.attach_image(photo()).unwrap();
        flow.advance().unwrap();
        flow.toggle_symptom("Itching").unwrap();
        flow.set_description("red itchy rash that appeared 3 days ago");
        flow
    }

    #[test]
    fn test_rejects_bad_uploads() {
        let mut flow = IntakeFlow::new(TEN_MIB);

        let gif = ImageUpload::new("a.gif", "image/gif", vec![0; 4]);
        assert_eq!(flow.attach_image(gif), Err(IntakeError::InvalidImageType));
        assert_eq!(flow.notice().unwrap().severity, NoticeSeverity::Error);

        let huge = ImageUpload::new("a.png", "image/png", vec![0; (TEN_MIB + 1) as usize]);
        let err = flow.attach_image(huge).unwrap_err();
        assert_eq!(err.to_string(), "Image size exceeds 10MB limit");
        assert!(flow.image().is_none());
    }

    #[test]
    fn test_image_step_gate() {
        let mut flow = IntakeFlow::new(TEN_MIB);
        assert!(!flow.can_advance());
        assert_eq!(flow.advance(), Err(IntakeError::CannotAdvance(IntakeStep::Image)));

        flow.set_description("itchy");
        assert_eq!(flow.advance(), Ok(IntakeStep::Symptoms));
    }

    #[test]
    fn test_submit_guard_order() {
        let mut flow = IntakeFlow::new(TEN_MIB);
        flow.set_description("itchy");
        flow.advance().unwrap();

        assert_eq!(flow.begin_submission().unwrap_err(), IntakeError::MissingImage);

        flow.attach_image(photo()).unwrap();
        assert_eq!(flow.begin_submission().unwrap_err(), IntakeError::MissingSymptoms);

        flow.toggle_symptom("rash").unwrap();
        flow.set_description("***");
        assert_eq!(flow.begin_submission().unwrap_err(), IntakeError::MissingDescription);
        assert_eq!(
            flow.notice().unwrap().message,
            "Please describe your problem before submitting."
        );
    }

    #[test]
    fn test_toggle_symptom() {
        let mut flow = IntakeFlow::new(TEN_MIB);
        assert_eq!(flow.toggle_symptom("itchng"), Ok(true));
        assert_eq!(flow.selected_symptoms(), ["Itching"]);
        assert_eq!(flow.toggle_symptom("Itching"), Ok(false));
        assert!(flow.selected_symptoms().is_empty());
        assert!(matches!(
            flow.toggle_symptom("headache"),
            Err(IntakeError::UnknownSymptom(_))
        ));
    }

    #[test]
    fn test_successful_submission_reaches_result() {
        let mut flow = ready_flow();
        let request = flow.begin_submission().unwrap();

        assert!(flow.is_submitting());
        assert_eq!(request.input.selected_symptoms, vec!["Itching"]);
        assert_eq!(flow.begin_submission().unwrap_err(), IntakeError::SubmissionInFlight);

        assert!(flow.complete_submission(request.ticket, Outcome::success(summary())));
        assert_eq!(flow.step(), IntakeStep::Result);
        assert_eq!(flow.summary().unwrap().diagnosis, "Dermatitis");
        assert!(!flow.can_advance());
    }

    #[test]
    fn test_failure_is_retryable() {
        let mut flow = ready_flow();
        let first = flow.begin_submission().unwrap();

        assert!(flow.complete_submission(first.ticket, Outcome::failure("HTTP error! status: 500")));
        assert_eq!(flow.step(), IntakeStep::Symptoms);
        assert_eq!(flow.notice().unwrap().severity, NoticeSeverity::Error);
        assert!(flow.summary().is_none());

        let retry = flow.begin_submission().unwrap();
        assert_ne!(retry.ticket, first.ticket);
        assert!(flow.complete_submission(retry.ticket, Outcome::success(summary())));
        assert_eq!(flow.step(), IntakeStep::Result);
    }

    #[test]
    fn test_result_after_reset_is_discarded() {
        let mut flow = ready_flow();
        let request = flow.begin_submission().unwrap();

        flow.reset();

        assert!(!flow.complete_submission(request.ticket, Outcome::success(summary())));
        assert_eq!(flow.step(), IntakeStep::Image);
        assert!(flow.result().is_none());
        assert!(flow.selected_symptoms().is_empty());
        assert!(flow.description().is_empty());
    }

    #[test]
    fn test_remove_image_clears_later_fields() {
        let mut flow = ready_flow();
        let request = flow.begin_submission().unwrap();
        flow.complete_submission(request.ticket, Outcome::success(summary()));

        flow.remove_image();

        assert_eq!(flow.step(), IntakeStep::Image);
        assert!(flow.image().is_none());
        assert!(flow.result().is_none());
        assert!(flow.selected_symptoms().is_empty());
    }

    #[test]
    fn test_no_second_submission_after_removing_image_at_result() {
        let mut flow = ready_flow();
        let request = flow.begin_submission().unwrap();
        flow.complete_submission(request.ticket, Outcome::success(summary()));
        assert_eq!(flow.begin_submission().unwrap_err(), IntakeError::CannotAdvance(IntakeStep::Result));

        flow.remove_image();
        flow.attach_image(photo()).unwrap();
        flow.toggle_symptom("Itching").unwrap();
        flow.set_description("still itchy");

        assert_eq!(flow.begin_submission().unwrap_err(), IntakeError::CannotAdvance(IntakeStep::Image));
        assert!(!flow.is_submitting());

        flow.advance().unwrap();
        assert!(flow.begin_submission().is_ok());
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(width, height)
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_image_quality_graded_on_attach() {
        let mut flow = IntakeFlow::new(TEN_MIB);
        let cases = [
            (499, 800, ImageQuality::Poor),
            (500, 800, ImageQuality::Good),
            (999, 1200, ImageQuality::Good),
            (1000, 1000, ImageQuality::Excellent),
        ];
        for (width, height, expected) in cases {
            let upload = ImageUpload::new("arm.png", "image/png", png(width, height));
            flow.attach_image(upload).unwrap();
            assert_eq!(flow.image_quality(), Some(expected), "{}x{}", width, height);
        }

        flow.attach_image(photo()).unwrap();
        assert_eq!(flow.image_quality(), None);

        flow.remove_image();
        assert_eq!(flow.image_quality(), None);
    }

    #[test]
    fn test_report_requires_sign_in() {
        let mut flow = ready_flow();
        let request = flow.begin_submission().unwrap();
        flow.complete_submission(request.ticket, Outcome::success(summary()));

        let generator = ReportGenerator::from_config(&crate::config::ClientConfig::default());
        assert!(flow.generate_report(&generator, &Session::anonymous()).is_err());
        assert_eq!(flow.notice().unwrap().severity, NoticeSeverity::Warning);

        let session = Session {
            is_signed_in: true,
            display_name: Some("Jane Doe".into()),
        };
        let report = flow.generate_report(&generator, &session).unwrap();
        assert_eq!(report.file_name, "MediDiagnose_Medical_Report_Jane_Doe.pdf");
    }

    #[test]
    fn test_report_for_non_latin_name() {
        let mut flow = ready_flow();
        let request = flow.begin_submission().unwrap();
        flow.complete_submission(request.ticket, Outcome::success(summary()));

        let generator = ReportGenerator::from_config(&crate::config::ClientConfig::default());
        let session = Session {
            is_signed_in: true,
            display_name: Some("李明".into()),
        };
        assert!(flow.generate_report(&generator, &session).is_ok());
        assert_eq!(flow.notice().unwrap().severity, NoticeSeverity::Success);
    }
}
