use rust_decimal::Decimal;
use smartstring::alias::String as SmartString;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::FileId;

use super::services::broadcaster::BroadcastButton;
use super::services::storage::types::Worker;

pub type Wizard = Dialogue<WizardState, InMemStorage<WizardState>>;

/// The small projection of a worker row a wizard carries between steps.
#[derive(Clone, Debug)]
pub struct WorkerRef {
    pub id: i64,
    pub username: SmartString,
    pub full_name: String,
}

impl From<&Worker> for WorkerRef {
    fn from(worker: &Worker) -> Self {
        WorkerRef {
            id: worker.id,
            username: worker.username.clone(),
            full_name: worker.full_name.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ProfitStage {
    #[strum(serialize = "Депозит")]
    Deposit,
    #[strum(serialize = "Налог")]
    Tax,
}

#[derive(Clone)]
pub struct ProfitDraft {
    pub worker: WorkerRef,
    pub service: String,
    pub amount: Decimal,
    pub percent: u32,
    pub stage: ProfitStage,
}

#[derive(Clone)]
pub struct BroadcastDraft {
    pub photo_id: Option<FileId>,
    pub title: String,
    pub text: String,
    pub button: Option<BroadcastButton>,
}

/// Every linear wizard of the bot shares one dialogue enum; cancel at any
/// step resets to Idle and discards everything collected so far.
#[derive(Clone, Default)]
pub enum WizardState {
    #[default]
    Idle,

    // Registration
    RegAgreement {
        referrer_id: Option<i64>,
    },
    RegExperience {
        referrer_id: Option<i64>,
    },
    RegSource {
        referrer_id: Option<i64>,
        experience: String,
    },

    // Profile
    SetWallet,

    // Admin: profit entry
    ProfitWorker,
    ProfitService {
        worker: WorkerRef,
    },
    ProfitAmount {
        worker: WorkerRef,
        service: String,
    },
    ProfitPercent {
        worker: WorkerRef,
        service: String,
        amount: Decimal,
    },
    ProfitStagePick {
        worker: WorkerRef,
        service: String,
        amount: Decimal,
        percent: u32,
    },
    ProfitConfirm {
        draft: ProfitDraft,
    },

    // Admin: broadcast
    BroadcastPhoto,
    BroadcastTitle {
        photo_id: Option<FileId>,
    },
    BroadcastText {
        photo_id: Option<FileId>,
        title: String,
    },
    BroadcastButton {
        photo_id: Option<FileId>,
        title: String,
        text: String,
    },
    BroadcastConfirm {
        draft: BroadcastDraft,
    },

    // Admin: mentors
    MentorUser,
    MentorService {
        user: WorkerRef,
    },
    MentorPercent {
        user: WorkerRef,
        service: String,
    },
    AssignStudent,
    AssignMentor {
        student: WorkerRef,
    },

    // Admin: services
    ServiceName,
    ServiceManual {
        name: String,
    },
    ServiceBot {
        name: String,
        manual_link: Option<String>,
    },

    // Admin: settings
    WelcomeText,

    // Mentor panel
    MentorMessage,
    MentorMessageConfirm {
        text: String,
    },
}
