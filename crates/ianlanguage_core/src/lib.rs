pub mod domain;
pub mod flow;
pub mod i18n;
pub mod ports;

pub use domain::{AuthSession, LanguageCode, LocalizationState, Registration, SocialProvider};
pub use flow::{Action, Collaborators, FlowError, FlowOptions, OnboardingFlowController, Outcome, Step};
pub use i18n::{LocalePack, LocalizationStore, SaveOutcome, Translations};
pub use ports::{
    AuthenticationService, CodeDelivery, Delivery, KeyValueStore, Navigator, PortError, PortResult, Route,
};
