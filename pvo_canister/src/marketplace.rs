// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Marketplace
//!
//! Sellers list products; buyers reserve a purchase order for a product, pay
//! its price on the ledger and complete the purchase, which bumps the
//! product's sold amount. Every completed purchase is kept, in insertion
//! order.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        PoisonError, RwLock,
    },
};

use async_trait::async_trait;
use pvo_core::{
    config::{InitCell, ReservationConfig},
    manager::{
        adapters::{Fulfillment, LedgerQuery},
        context::memory::{InMemoryContext, PersistPolicy},
        Manager, PaymentProof,
    },
    Error,
};
use pvo_ledger::Principal;
use pvo_order::{CorrelationId, OrderError, OrdersSnapshot, PaymentOrder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub attachment_url: String,
    /// Price in e8s
    pub price: u64,
    pub seller: Principal,
    pub sold_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub title: String,
    pub description: String,
    pub location: String,
    pub attachment_url: String,
    pub price: u64,
}

impl ProductPayload {
    fn validate(&self) -> Result<(), OrderError> {
        if self.title.trim().is_empty() {
            return Err(OrderError::InvalidPayload(
                "product title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceState {
    pub orders: OrdersSnapshot,
    pub products: Vec<Product>,
    pub next_product_id: u64,
}

type Products = RwLock<BTreeMap<u64, Product>>;

fn product_not_found(id: u64) -> OrderError {
    OrderError::NotFound(format!("product with id={id} not found"))
}

struct MarkSold<'a> {
    products: &'a Products,
}

#[async_trait]
impl Fulfillment<u64> for MarkSold<'_> {
    type Output = Product;

    async fn precheck(&self, _payer: &Principal, product_id: &u64) -> Result<(), OrderError> {
        if !self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(product_id)
        {
            return Err(product_not_found(*product_id));
        }
        Ok(())
    }

    async fn apply(&self, _payer: &Principal, product_id: u64) -> Result<Product, OrderError> {
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        let product = products
            .get_mut(&product_id)
            .ok_or_else(|| product_not_found(product_id))?;
        product.sold_amount += 1;
        Ok(product.clone())
    }
}

pub struct Marketplace<L> {
    manager: Manager<InMemoryContext, L>,
    products: Products,
    next_product_id: InitCell<AtomicU64>,
}

impl<L> Marketplace<L> {
    pub fn new(config: &ReservationConfig, ledger: L) -> Self {
        Self::with_manager(Manager::new(
            config,
            InMemoryContext::new(PersistPolicy::AppendOnly),
            ledger,
        ))
    }

    pub fn with_manager(manager: Manager<InMemoryContext, L>) -> Self {
        Self {
            manager,
            products: RwLock::default(),
            next_product_id: InitCell::new("next product id"),
        }
    }

    pub fn init(&self) -> Result<(), Error> {
        self.next_product_id.init(AtomicU64::new(0))?;
        log::info!("Marketplace initialised");
        Ok(())
    }

    pub fn manager(&self) -> &Manager<InMemoryContext, L> {
        &self.manager
    }

    pub fn is_initialized(&self) -> bool {
        self.next_product_id.is_initialized()
    }

    pub fn add_product(&self, caller: &Principal, payload: ProductPayload) -> Result<Product, Error> {
        payload.validate()?;
        let next_product_id = self.next_product_id.get()?;
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        let product = Product {
            id: next_product_id.fetch_add(1, Ordering::SeqCst),
            title: payload.title,
            description: payload.description,
            location: payload.location,
            attachment_url: payload.attachment_url,
            price: payload.price,
            seller: caller.clone(),
            sold_amount: 0,
        };
        products.insert(product.id, product.clone());
        log::info!("Product {} listed by {caller}", product.id);
        Ok(product)
    }

    /// Replaces the listing fields of a product. Only its seller may do so.
    pub fn update_product(
        &self,
        caller: &Principal,
        id: u64,
        payload: ProductPayload,
    ) -> Result<Product, Error> {
        payload.validate()?;
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        let product = products.get_mut(&id).ok_or_else(|| product_not_found(id))?;
        if &product.seller != caller {
            return Err(OrderError::InvalidPayload(format!(
                "only the seller can update product with id={id}"
            ))
            .into());
        }
        product.title = payload.title;
        product.description = payload.description;
        product.location = payload.location;
        product.attachment_url = payload.attachment_url;
        product.price = payload.price;
        Ok(product.clone())
    }

    pub fn get_products(&self) -> Vec<Product> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn get_product(&self, id: u64) -> Result<Product, Error> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| product_not_found(id).into())
    }

    pub fn delete_product(&self, caller: &Principal, id: u64) -> Result<Product, Error> {
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        match products.get(&id) {
            None => return Err(product_not_found(id).into()),
            Some(product) if &product.seller != caller => {
                return Err(OrderError::InvalidPayload(format!(
                    "only the seller can delete product with id={id}"
                ))
                .into())
            }
            Some(_) => {}
        }
        let removed = products.remove(&id).ok_or_else(|| product_not_found(id))?;
        log::info!("Product {id} delisted by {caller}");
        Ok(removed)
    }
}

impl<L> Marketplace<L>
where
    L: LedgerQuery + Send + Sync,
{
    /// Reserves a purchase of `product_id` at its current price.
    pub async fn create_order(&self, caller: &Principal, product_id: u64) -> Result<PaymentOrder, Error> {
        let product = self.get_product(product_id)?;
        let order = self
            .manager
            .create_reservation_for(caller, product.price, product.id)
            .await?;
        Ok(order.to_payment_order())
    }

    /// Completes the purchase order `memo` once its payment is found at
    /// `block`, and returns the completed order.
    ///
    /// The order is due the price the product had when it was reserved, and
    /// only buys the product it was reserved for.
    pub async fn complete_purchase(
        &self,
        caller: &Principal,
        product_id: u64,
        order_id: String,
        block: u64,
        memo: CorrelationId,
    ) -> Result<PaymentOrder, Error> {
        self.get_product(product_id)?;
        let proof = PaymentProof {
            order_id,
            block_index: block,
            memo,
        };
        let fulfilled = self
            .manager
            .complete_reserved_order(
                caller,
                &proof,
                &product_id.to_string(),
                &MarkSold {
                    products: &self.products,
                },
                product_id,
            )
            .await?;
        log::info!(
            "Product {product_id} sold to {caller}, {} sold so far",
            fulfilled.output.sold_amount
        );
        Ok(fulfilled.order.to_payment_order())
    }

    pub async fn get_pending_orders(&self) -> Result<Vec<PaymentOrder>, Error> {
        Ok(self
            .manager
            .pending_orders()
            .await?
            .iter()
            .map(|order| order.to_payment_order())
            .collect())
    }

    pub async fn get_completed_orders(&self) -> Result<Vec<PaymentOrder>, Error> {
        Ok(self
            .manager
            .completed_orders()
            .await?
            .iter()
            .map(|order| order.to_payment_order())
            .collect())
    }

    pub async fn pre_upgrade(&self) -> Result<MarketplaceState, Error> {
        Ok(MarketplaceState {
            orders: self.manager.snapshot().await?,
            products: self.get_products(),
            next_product_id: self
                .next_product_id
                .get()
                .map(|next| next.load(Ordering::SeqCst))
                .unwrap_or(0),
        })
    }

    pub async fn post_upgrade(&self, state: MarketplaceState) -> Result<(), Error> {
        self.next_product_id
            .init(AtomicU64::new(state.next_product_id))?;
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(state.products.into_iter().map(|product| (product.id, product)));
        self.manager.restore(state.orders).await?;
        log::info!("Marketplace restored");
        Ok(())
    }
}
