#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by every crate of the workspace.
//!
//! * [`polar_error`] turns a plain enum into a context-aware error type whose
//!   variants are tagged with a caller-facing [`ErrorKind`](../polar_domain/enum.ErrorKind.html).
//! * [`polar_slice`] turns a struct into a cheaply clonable feature slice handle that can be
//!   registered in the kernel's slice registry.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! polar-derive.workspace = true
//! polar-domain.workspace = true
//! thiserror.workspace = true
//! ```

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&str>` and `From<String>` when an `Internal`
///   variant is present.
/// * **Error Kinds**: Every variant may carry `#[kind(NotFound)]` (or `Unavailable`,
///   `Conflict`, `Malformed`, `Internal`). The macro strips the tag and generates
///   `fn kind(&self) -> polar_domain::ErrorKind`; untagged variants report `Internal`.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field (or a field marked
///    `#[source]`/`#[from]`) together with a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[polar_derive::polar_error]
/// pub enum CatalogError {
///     #[kind(NotFound)]
///     #[error("Offering not found{}: {message}", format_context(.context))]
///     Missing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[kind(Unavailable)]
///     #[error("Database error{}: {source}", format_context(.context))]
///     Database { source: surrealdb::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn lookup() -> Result<(), CatalogError> {
///     run_query().context("Loading offering")?; // surrealdb::Error -> CatalogError::Database
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn polar_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro to define a Vertical Slice handle.
///
/// This macro transforms a struct into a full Slice pattern:
/// 1. Generates a thread-safe `Arc` wrapper.
/// 2. Implements `Deref` for transparent access to the inner state.
/// 3. Implements `FeatureSlice` for registration in the kernel.
///
/// # Example
/// ```rust,ignore
/// #[polar_derive::polar_slice]
/// pub struct Registration {
///     pub engine: PrerequisiteEngine,
/// }
///
/// fn init(engine: PrerequisiteEngine) -> Registration {
///     Registration::new(RegistrationInner { engine })
/// }
/// ```
#[proc_macro_attribute]
pub fn polar_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
