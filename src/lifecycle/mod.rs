//! Trigger handling and outcome reporting

mod callback;
mod dispatcher;
mod event;

pub use callback::{
    empty_response_data, with_lifecycle_reporting, CallbackResponse, CallbackStatus,
    InvocationContext, LifecycleCallback,
};
pub use dispatcher::{
    Collaborators, DispatchReport, LifecycleDispatcher, TargetReport, MISSING_BUCKET_NAME,
};
pub use event::{LifecycleRequest, RefreshNotification, RequestKind, TriggerEvent};
