//! Shared test utilities for `storefront-sync`.
//!
//! Provides an in-memory storage database, tracing setup, and [`FakeBackend`]:
//! an in-process stand-in for the storefront REST API that keeps a cookie session,
//! a cart and a wishlist, and can be told to fail in the ways the real one does.

use crate::{
    api::{ApiResponse, Transport, endpoints},
    core::notice::{Notice, Notifier},
    errors::{Error, Result},
    models::Address,
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all storage tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// A product the fake backend knows about.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    /// Product identifier
    pub product_id: String,
    /// Display name
    pub product_name: String,
    /// Unit selling price
    pub selling: f64,
    /// Unit list price
    pub price: f64,
    /// Category
    pub category: String,
    /// Fabric
    pub fabric: String,
    /// Units in stock
    pub stock: u32,
}

/// Three sarees: `saree-1` (silk, 2 in stock, 2500), `saree-2` (cotton, 5 in
/// stock, 1800) and `saree-3` (linen, 3 in stock, 2100).
pub fn sample_catalog() -> Vec<CatalogProduct> {
    vec![
        CatalogProduct {
            product_id: "saree-1".to_string(),
            product_name: "Kanjivaram Silk".to_string(),
            selling: 2500.0,
            price: 3000.0,
            category: "Silk".to_string(),
            fabric: "Silk".to_string(),
            stock: 2,
        },
        CatalogProduct {
            product_id: "saree-2".to_string(),
            product_name: "Bengal Tant".to_string(),
            selling: 1800.0,
            price: 1800.0,
            category: "Cotton".to_string(),
            fabric: "Cotton".to_string(),
            stock: 5,
        },
        CatalogProduct {
            product_id: "saree-3".to_string(),
            product_name: "Bhagalpuri Linen".to_string(),
            selling: 2100.0,
            price: 2400.0,
            category: "Linen".to_string(),
            fabric: "Linen".to_string(),
            stock: 3,
        },
    ]
}

/// A delivery address with the given id.
pub fn sample_address(id: &str) -> Address {
    Address {
        id: Some(id.to_string()),
        address_name: format!("Home {id}"),
        full_name: "Meera Iyer".to_string(),
        address_content: "12 Weavers Lane".to_string(),
        landmark: "Near the handloom co-op".to_string(),
        pincode: "600001".to_string(),
        state: "Tamil Nadu".to_string(),
        phone: "9876543210".to_string(),
        kind: "home".to_string(),
        email: None,
    }
}

/// Collects notices for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Every notice so far, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Just the notice texts.
    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

#[derive(Debug, Clone)]
struct FakeUser {
    id: String,
    role: &'static str,
}

#[derive(Debug, Default)]
struct FakeState {
    catalog: Vec<CatalogProduct>,
    user: Option<FakeUser>,
    // (product id, quantity) in insertion order
    cart: Vec<(String, u32)>,
    wishlist: Vec<String>,
    offline: bool,
    forced: HashMap<String, (u16, Option<String>)>,
    gates: HashMap<String, Arc<Notify>>,
    requests: HashMap<String, usize>,
}

/// In-process storefront backend implementing [`Transport`].
#[derive(Debug)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    /// A backend selling `catalog`, with nobody logged in.
    pub fn new(catalog: Vec<CatalogProduct>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                catalog,
                ..FakeState::default()
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Establishes a customer cookie session.
    pub fn log_in(&self, user_id: &str) {
        self.lock().user = Some(FakeUser {
            id: user_id.to_string(),
            role: "customer",
        });
    }

    /// Establishes an admin cookie session.
    pub fn log_in_as_admin(&self, user_id: &str) {
        self.lock().user = Some(FakeUser {
            id: user_id.to_string(),
            role: "admin",
        });
    }

    /// Drops the cookie session server-side; every call now answers 401.
    pub fn log_out(&self) {
        self.lock().user = None;
    }

    /// Whether a cookie session exists.
    pub fn is_logged_in(&self) -> bool {
        self.lock().user.is_some()
    }

    /// While offline every request fails without a response.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Makes `path` answer `status` with an optional message from now on.
    pub fn force_status(&self, path: &str, status: u16, message: Option<&str>) {
        self.lock()
            .forced
            .insert(path.to_string(), (status, message.map(str::to_string)));
    }

    /// Holds the next request to `path` until the returned handle is notified.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().gates.insert(path.to_string(), Arc::clone(&gate));
        gate
    }

    /// Requests received for `path`, including failed ones.
    pub fn request_count(&self, path: &str) -> usize {
        self.lock().requests.get(path).copied().unwrap_or(0)
    }

    /// Changes the stock of a catalog product.
    pub fn set_stock(&self, product_id: &str, stock: u32) {
        if let Some(product) = self
            .lock()
            .catalog
            .iter_mut()
            .find(|p| p.product_id == product_id)
        {
            product.stock = stock;
        }
    }

    async fn handle(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let gate = {
            let mut state = self.lock();
            *state.requests.entry(path.to_string()).or_default() += 1;
            state.gates.remove(path)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.lock();
        if state.offline {
            return Err(Error::Network {
                message: "connection refused".to_string(),
            });
        }
        if let Some((status, message)) = state.forced.get(path) {
            return Ok(ApiResponse::new(
                *status,
                json!({ "success": false, "message": message }),
            ));
        }
        Ok(state.route(path, body))
    }
}

fn ok(data: Value) -> ApiResponse {
    ApiResponse::new(200, json!({ "success": true, "data": data }))
}

fn fail(status: u16, message: &str) -> ApiResponse {
    ApiResponse::new(status, json!({ "success": false, "message": message }))
}

impl FakeState {
    fn product(&self, product_id: &str) -> Option<&CatalogProduct> {
        self.catalog.iter().find(|p| p.product_id == product_id)
    }

    fn route(&mut self, path: &str, body: &Value) -> ApiResponse {
        if path == endpoints::LOGOUT {
            self.user = None;
            return ApiResponse::new(200, json!({ "success": true, "message": "Logged out" }));
        }
        let Some(user) = self.user.clone() else {
            return fail(401, "Please login");
        };

        let product_id = body.get("productId").and_then(Value::as_str).unwrap_or("");
        match path {
            endpoints::ACCOUNT_DETAILS => ok(json!({
                "_id": user.id,
                "name": "Meera Iyer",
                "email": "meera@example.com",
                "role": user.role,
            })),
            endpoints::COUNT_CART => ok(json!({ "count": self.cart.len() })),
            endpoints::COUNT_WISHLIST => ok(json!({ "count": self.wishlist.len() })),
            endpoints::FETCH_CART => ok(Value::Array(
                self.cart
                    .iter()
                    .filter_map(|(id, quantity)| {
                        self.product(id).map(|p| {
                            json!({
                                "productId": p.product_id,
                                "quantity_present": quantity,
                                "total_quantity": p.stock,
                                "selling": p.selling,
                                "price": p.price,
                                "productName": p.product_name,
                                "productImage": format!("https://img.example.com/{}.jpg", p.product_id),
                                "category": p.category,
                            })
                        })
                    })
                    .collect(),
            )),
            endpoints::FETCH_WISHLIST => ok(Value::Array(
                self.wishlist
                    .iter()
                    .filter_map(|id| {
                        self.product(id).map(|p| {
                            json!({
                                "productId": p.product_id,
                                "productName": p.product_name,
                                "selling": p.selling,
                                "price": p.price,
                                "category": p.category,
                                "fabric": p.fabric,
                                "productImage": [format!("https://img.example.com/{}.jpg", p.product_id)],
                            })
                        })
                    })
                    .collect(),
            )),
            endpoints::ADD_TO_CART => {
                if self.product(product_id).is_none() {
                    return fail(404, "Product not found");
                }
                if !self.cart.iter().any(|(id, _)| id == product_id) {
                    self.cart.push((product_id.to_string(), 1));
                }
                ApiResponse::new(200, json!({ "success": true, "message": "Added to cart" }))
            }
            endpoints::REMOVE_FROM_CART => {
                self.cart.retain(|(id, _)| id != product_id);
                ApiResponse::new(200, json!({ "success": true }))
            }
            endpoints::UPDATE_CART => {
                let stock = self.product(product_id).map_or(0, |p| p.stock);
                let requested = body
                    .get("quantity_present")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                let Some(line) = self.cart.iter_mut().find(|(id, _)| id == product_id) else {
                    return fail(404, "Product not in cart");
                };
                if requested < 1 || requested > u64::from(stock) {
                    return fail(400, "Requested quantity is not available");
                }
                line.1 = u32::try_from(requested).unwrap_or(u32::MAX);
                ApiResponse::new(200, json!({ "success": true }))
            }
            endpoints::ADD_TO_WISHLIST => {
                if self.product(product_id).is_none() {
                    return fail(404, "Product not found");
                }
                if !self.wishlist.iter().any(|id| id == product_id) {
                    self.wishlist.push(product_id.to_string());
                }
                ApiResponse::new(200, json!({ "success": true }))
            }
            endpoints::REMOVE_FROM_WISHLIST => {
                self.wishlist.retain(|id| id != product_id);
                ApiResponse::new(200, json!({ "success": true }))
            }
            _ => fail(404, "Not found"),
        }
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.handle(path, &Value::Null).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.handle(path, body).await
    }
}
