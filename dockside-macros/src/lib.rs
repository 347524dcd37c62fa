extern crate proc_macro;

mod http_error;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for mapping error variants to an HTTP status and a user-facing message
///
/// Every variant must carry `#[http_error(...)]`, which accepts one or two arguments
/// - status code (required)
/// - http error message (optional)
///
/// ### Status Code
///
/// May be specified as a `StatusCode` constant (e.g. `BAD_REQUEST`) or a number (e.g. `400`).
/// Returned by `http_code()`.
///
/// ### HTTP Error Message
///
/// A string literal with basic interpolation:
/// - Tuple variants interpolate indices: `"file {0} is {1} bytes"`
/// - Struct variants interpolate field names: `"failed to submit {form}"`
///
/// Only the fields a message references are bound, so a variant can carry internal
/// details (a source error, say) that never reach the caller.
///
/// Without a message, `Display` is used. That way `thiserror` provides the log text and
/// `http_error` only overrides it where the user should see something else.
///
/// Returned by `http_message()`.
///
/// ### Example
///
/// ```rust,ignore
/// #[derive(Debug, thiserror::Error, dockside::HttpError)]
/// enum ApiError {
///     #[error("CV file is required")]
///     #[http_error(BAD_REQUEST)]
///     AttachmentMissing,
///
///     #[error("{form} delivery failed: {source}")]
///     #[http_error(500, "Failed to submit {form}")]
///     Delivery { form: FormKind, source: MailError },
/// }
/// ```
#[proc_macro_derive(HttpError, attributes(http_error))]
pub fn http_error_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    http_error::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
