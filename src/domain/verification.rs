//! Verification run states and outcome records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position of a verification run in its pipeline.
///
/// Runs move strictly forward through [`FlowState::PIPELINE`]; there is
/// no skipping and no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowState {
    Idle,
    Uploading,
    Ocr,
    AiAnalysis,
    LedgerCheck,
    Complete,
}

impl FlowState {
    /// States a run visits after leaving `Idle`, in order
    pub const PIPELINE: [FlowState; 5] = [
        FlowState::Uploading,
        FlowState::Ocr,
        FlowState::AiAnalysis,
        FlowState::LedgerCheck,
        FlowState::Complete,
    ];

    /// The state entered after this one, if any
    pub fn next(&self) -> Option<FlowState> {
        match self {
            FlowState::Idle => Some(FlowState::Uploading),
            FlowState::Uploading => Some(FlowState::Ocr),
            FlowState::Ocr => Some(FlowState::AiAnalysis),
            FlowState::AiAnalysis => Some(FlowState::LedgerCheck),
            FlowState::LedgerCheck => Some(FlowState::Complete),
            FlowState::Complete => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Complete)
    }

    /// Progress bar fill for this state, in percent
    pub fn progress_percent(&self) -> u8 {
        match self {
            FlowState::Idle => 0,
            FlowState::Uploading => 25,
            FlowState::Ocr => 50,
            FlowState::AiAnalysis => 75,
            FlowState::LedgerCheck | FlowState::Complete => 100,
        }
    }

    /// Status line shown while in this state
    pub fn status_text(&self) -> &'static str {
        match self {
            FlowState::Idle => "Waiting for document...",
            FlowState::Uploading => "Uploading documents to secure server...",
            FlowState::Ocr => "Extracting text using OCR...",
            FlowState::AiAnalysis => "Running fraud detection model...",
            FlowState::LedgerCheck => "Verifying against blockchain registry...",
            FlowState::Complete => "Analysis complete! Generating results...",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Uploading => "uploading",
            FlowState::Ocr => "ocr",
            FlowState::AiAnalysis => "ai-analysis",
            FlowState::LedgerCheck => "ledger-check",
            FlowState::Complete => "complete",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict of a verification run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    Suspicious,
    Fraudulent,
}

impl VerificationOutcome {
    pub const ALL: [VerificationOutcome; 3] = [
        VerificationOutcome::Verified,
        VerificationOutcome::Suspicious,
        VerificationOutcome::Fraudulent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::Verified => "verified",
            VerificationOutcome::Suspicious => "suspicious",
            VerificationOutcome::Fraudulent => "fraudulent",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            VerificationOutcome::Verified => "✅",
            VerificationOutcome::Suspicious => "⚠️",
            VerificationOutcome::Fraudulent => "❌",
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            VerificationOutcome::Verified => "CERTIFICATE VERIFIED",
            VerificationOutcome::Suspicious => "CERTIFICATE SUSPICIOUS",
            VerificationOutcome::Fraudulent => "CERTIFICATE FRAUDULENT",
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sample certificates offered by the portal's demo buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoSample {
    Valid,
    Suspicious,
    Fraudulent,
}

impl DemoSample {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoSample::Valid => "valid",
            DemoSample::Suspicious => "suspicious",
            DemoSample::Fraudulent => "fraudulent",
        }
    }

    /// File name the portal shows for the sample, e.g. `demo-valid.pdf`
    pub fn file_name(&self) -> String {
        format!("demo-{}.pdf", self.as_str())
    }

    pub fn outcome(&self) -> VerificationOutcome {
        match self {
            DemoSample::Valid => VerificationOutcome::Verified,
            DemoSample::Suspicious => VerificationOutcome::Suspicious,
            DemoSample::Fraudulent => VerificationOutcome::Fraudulent,
        }
    }

    /// Recognize a demo file name such as `demo-suspicious.pdf`
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.strip_prefix("demo-")
            .and_then(|rest| rest.strip_suffix(".pdf"))
            .and_then(|sample| sample.parse().ok())
    }
}

impl FromStr for DemoSample {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(DemoSample::Valid),
            "suspicious" => Ok(DemoSample::Suspicious),
            "fraudulent" => Ok(DemoSample::Fraudulent),
            other => Err(format!("unknown demo sample: {other}")),
        }
    }
}

/// Fields read off the certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub student_name: Option<String>,
    pub institution: String,
    pub degree: Option<String>,
    pub issue_date: String,
}

/// Integrity check verdicts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityChecks {
    pub signature_match: String,
    pub watermark: String,
    pub ledger: String,
}

impl IntegrityChecks {
    /// Check verdicts that accompany an outcome
    pub fn for_outcome(outcome: VerificationOutcome) -> Self {
        let (signature_match, watermark, ledger) = match outcome {
            VerificationOutcome::Verified => ("Verified", "Authentic", "Confirmed"),
            VerificationOutcome::Suspicious => ("Partial Match", "Questionable", "Not Found"),
            VerificationOutcome::Fraudulent => ("No Match", "Fake", "Rejected"),
        };
        Self {
            signature_match: signature_match.to_string(),
            watermark: watermark.to_string(),
            ledger: ledger.to_string(),
        }
    }
}

/// Immutable result of one verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub outcome: VerificationOutcome,
    /// Confidence score, 0-100
    pub confidence: u8,
    /// OCR accuracy, 0-100
    pub ocr_accuracy: u8,
    pub fields: ExtractedFields,
    pub checks: IntegrityChecks,
    pub anomalies: Vec<String>,
}

impl VerificationResult {
    /// The fixed record the portal shows for an outcome
    pub fn fixed(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Verified => Self {
                outcome,
                confidence: 98,
                ocr_accuracy: 97,
                fields: ExtractedFields {
                    student_name: Some("Rahul Kumar Singh".to_string()),
                    institution: "NIT Jamshedpur".to_string(),
                    degree: Some("Bachelor of Technology (Computer Science)".to_string()),
                    issue_date: "June 15, 2024".to_string(),
                },
                checks: IntegrityChecks::for_outcome(outcome),
                anomalies: Vec::new(),
            },
            VerificationOutcome::Suspicious => Self {
                outcome,
                confidence: 67,
                ocr_accuracy: 89,
                fields: ExtractedFields {
                    student_name: Some("Priya Sharma".to_string()),
                    institution: "Ranchi University".to_string(),
                    degree: Some("Master of Business Administration".to_string()),
                    issue_date: "March 20, 2023".to_string(),
                },
                checks: IntegrityChecks::for_outcome(outcome),
                anomalies: vec![
                    "Grade alterations detected".to_string(),
                    "Signature inconsistency".to_string(),
                    "Date format irregularity".to_string(),
                ],
            },
            VerificationOutcome::Fraudulent => Self {
                outcome,
                confidence: 94,
                ocr_accuracy: 45,
                fields: ExtractedFields {
                    student_name: Some("Unknown Person".to_string()),
                    institution: "Fake University".to_string(),
                    degree: Some("Diploma in Engineering".to_string()),
                    issue_date: "Invalid Date".to_string(),
                },
                checks: IntegrityChecks::for_outcome(outcome),
                anomalies: vec![
                    "Institution not recognized".to_string(),
                    "Forged signatures".to_string(),
                    "Invalid watermarks".to_string(),
                    "Incorrect certificate format".to_string(),
                ],
            },
        }
    }
}

/// Anomaly descriptions drawn for synthesized batch results
pub const ANOMALY_POOL: &[&str] = &[
    "Signature mismatch",
    "Watermark inconsistency",
    "Font irregularity",
    "Date format error",
    "Seal distortion",
    "Paper quality deviation",
];

/// Institutions drawn for synthesized batch results
pub const BATCH_INSTITUTIONS: &[&str] = &[
    "NIT Jamshedpur",
    "Ranchi University",
    "BIT Mesra",
    "XLRI Jamshedpur",
    "Central University of Jharkhand",
    "Kolhan University",
    "Sido Kanhu Murmu University",
];
