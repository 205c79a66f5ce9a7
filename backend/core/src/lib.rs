//! `appbridge-core`: data model shared by every appbridge crate.
//!
//! Manifests, calls and their expansion hints, binding trees and forms, the
//! per-invocation call request, call responses and timers.

pub mod binding;
pub mod call;
pub mod error;
pub mod manifest;
pub mod request;
pub mod response;
pub mod timer;

pub use binding::{collect_call_paths, Binding, Field, FieldType, Form, SelectOption, TextSubtype};
pub use call::{Call, Expand, ExpandLevel};
pub use error::AppError;
pub use manifest::{
    compare_versions, parse_version, Deploy, HttpDeploy, LambdaDeploy, LambdaFunction,
    LifecycleHook, Location, Manifest, ManifestBuilder, Permission,
};
pub use request::{parse_int_permissive, CallRequest, Channel, Context, Team, User};
pub use response::CallResponse;
pub use timer::Timer;
