//! Storefront REST API access.
//!
//! [`Transport`] is the HTTP seam: [`HttpTransport`] talks to the real backend with
//! a cookie jar, tests plug in an in-process fake. [`ApiClient`] layers the
//! endpoint paths and response envelope handling on top.

/// Typed endpoint calls over a transport
pub mod client;
/// `reqwest` transport with cookie-based session
pub mod http;
/// Transport trait and raw response envelope
pub mod transport;

pub use client::ApiClient;
pub use http::HttpTransport;
pub use transport::{ApiResponse, Transport};

/// Endpoint paths, relative to the configured base URL.
pub mod endpoints {
    /// `GET` identity of the cookie session; 401 means anonymous
    pub const ACCOUNT_DETAILS: &str = "/account-details";
    /// `GET` invalidate the server session
    pub const LOGOUT: &str = "/logout";
    /// `GET` number of cart items
    pub const COUNT_CART: &str = "/count-cart";
    /// `GET` full cart snapshot
    pub const FETCH_CART: &str = "/fetch-cart";
    /// `GET` number of wishlist items
    pub const COUNT_WISHLIST: &str = "/count-wishlist";
    /// `GET` full wishlist snapshot
    pub const FETCH_WISHLIST: &str = "/fetch-wishlist";
    /// `POST { productId }`
    pub const ADD_TO_CART: &str = "/add-to-cart";
    /// `POST { productId }`
    pub const REMOVE_FROM_CART: &str = "/remove-from-cart";
    /// `POST { productId, quantity_present }`
    pub const UPDATE_CART: &str = "/update-cart";
    /// `POST { productId }`
    pub const ADD_TO_WISHLIST: &str = "/add-to-wishlist";
    /// `POST { productId }`
    pub const REMOVE_FROM_WISHLIST: &str = "/remove-from-wishlist";
}
