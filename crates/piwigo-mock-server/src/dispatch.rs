// crates/piwigo-mock-server/src/dispatch.rs
// ============================================================================
// Module: Method Dispatcher
// Description: Fixture table and routing for emulated Piwigo RPC methods.
// Purpose: Map decoded method names to canned XML responses.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! Every supported Piwigo web-service call is a variant of [`PiwigoMethod`].
//! Method names are matched exactly (case-sensitive) once and then handled by
//! exhaustive matches. Fixtures are static; no request influences another.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::response::Response;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path of the Piwigo web-service endpoint.
pub const RPC_ENDPOINT: &str = "/ws.php";
/// Session cookie returned on every successful call; never validated.
pub const SESSION_COOKIE: &str = "pwg_id=\"12345\"";
/// Content type of fixture responses.
pub const XML_CONTENT_TYPE: &str = "text/xml";
/// XML declaration prefixed to every fixture document.
const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>";

// ============================================================================
// SECTION: Methods
// ============================================================================

/// Emulated Piwigo web-service methods.
///
/// # Invariants
/// - [`PiwigoMethod::name`] and [`PiwigoMethod::from_name`] are inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiwigoMethod {
    /// `pwg.session.login`
    SessionLogin,
    /// `pwg.session.getStatus`
    SessionGetStatus,
    /// `pwg.categories.getList`
    CategoriesGetList,
    /// `pwg.categories.add`
    CategoriesAdd,
    /// `pwg.images.addSimple`
    ImagesAddSimple,
    /// `pwg.images.rate`
    ImagesRate,
}

impl PiwigoMethod {
    /// All supported methods in table order.
    pub const ALL: [Self; 6] = [
        Self::SessionLogin,
        Self::SessionGetStatus,
        Self::CategoriesGetList,
        Self::CategoriesAdd,
        Self::ImagesAddSimple,
        Self::ImagesRate,
    ];

    /// Resolves a wire method name; matching is exact and case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pwg.session.login" => Some(Self::SessionLogin),
            "pwg.session.getStatus" => Some(Self::SessionGetStatus),
            "pwg.categories.getList" => Some(Self::CategoriesGetList),
            "pwg.categories.add" => Some(Self::CategoriesAdd),
            "pwg.images.addSimple" => Some(Self::ImagesAddSimple),
            "pwg.images.rate" => Some(Self::ImagesRate),
            _ => None,
        }
    }

    /// Returns the wire method name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SessionLogin => "pwg.session.login",
            Self::SessionGetStatus => "pwg.session.getStatus",
            Self::CategoriesGetList => "pwg.categories.getList",
            Self::CategoriesAdd => "pwg.categories.add",
            Self::ImagesAddSimple => "pwg.images.addSimple",
            Self::ImagesRate => "pwg.images.rate",
        }
    }

    /// Returns the method-specific XML fragment placed inside `<rsp>`.
    #[must_use]
    pub const fn fixture_fragment(self) -> &'static str {
        match self {
            Self::SessionLogin => "",
            Self::SessionGetStatus => "<username>SomeRandomDude</username>",
            Self::CategoriesGetList => "<categories></categories>",
            Self::CategoriesAdd => "<id>765</id>",
            Self::ImagesAddSimple | Self::ImagesRate => "<image_id>2387</image_id>",
        }
    }

    /// Returns the complete fixture document.
    #[must_use]
    pub fn fixture_document(self) -> String {
        format!("{XML_DECLARATION}<rsp stat=\"ok\">{}</rsp>", self.fixture_fragment())
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Routing decision for a decoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Known method on the RPC endpoint.
    Fixture(PiwigoMethod),
    /// Method name not in the fixture table.
    UnknownMethod,
    /// Path other than [`RPC_ENDPOINT`].
    NotFound,
}

impl Dispatch {
    /// Returns the HTTP status for this decision.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Fixture(_) => StatusCode::OK,
            Self::UnknownMethod => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Returns the response body, if any.
    #[must_use]
    pub fn body(self) -> Option<String> {
        match self {
            Self::Fixture(method) => Some(method.fixture_document()),
            Self::UnknownMethod | Self::NotFound => None,
        }
    }
}

/// Selects the response for a request path and decoded method name.
#[must_use]
pub fn dispatch(path: &str, method_name: &str) -> Dispatch {
    if path != RPC_ENDPOINT {
        return Dispatch::NotFound;
    }
    PiwigoMethod::from_name(method_name).map_or(Dispatch::UnknownMethod, Dispatch::Fixture)
}

impl IntoResponse for Dispatch {
    fn into_response(self) -> Response {
        match self.body() {
            Some(body) => (
                self.status(),
                [(CONTENT_TYPE, XML_CONTENT_TYPE), (SET_COOKIE, SESSION_COOKIE)],
                body,
            )
                .into_response(),
            None => self.status().into_response(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
