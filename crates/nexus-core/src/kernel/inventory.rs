//! Product catalog and stock ledger.
//!
//! ## Movement With Finance Link
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_movement(OUT 3 of "Café 1kg", link_to_finance = true)           │
//! │                                                                         │
//! │   product.current_stock = 10                                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   new stock = 10 - 3 = 7  ──(negative?)──► InsufficientStock, no change │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   StockMovement (APPROVED) ◄────── cross-linked ──────► Transaction     │
//! │     linked_transaction_id            INCOME 3 × cost, PENDING          │
//! │                                      category "Inventory"              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   one STOCK_MOVEMENT audit entry naming both ids                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info};

use super::{new_id, AuditAction, Kernel};
use crate::dto::{NewMovement, NewProduct, NewTransaction};
use crate::error::{CoreError, CoreResult, EntityKind, ValidationError};
use crate::types::{
    ApprovalStatus, Identity, MovementKind, Product, StockMovement, TransactionKind,
};
use crate::validation::{
    validate_movement_quantity, validate_name, validate_non_negative, validate_price,
    validate_search_query, validate_sku,
};
use crate::{INVENTORY_CATEGORY, INVENTORY_PAYMENT_METHOD};

impl Kernel {
    pub fn add_product(&mut self, actor: &Identity, new: NewProduct) -> CoreResult<Product> {
        validate_name("name", &new.name)?;
        validate_sku(&new.sku)?;
        validate_non_negative("min_stock", new.min_stock)?;
        validate_non_negative("current_stock", new.current_stock)?;
        validate_price("cost_price", new.cost_price)?;
        self.unit(&new.unit_id)?;

        let product = Product {
            id: new_id(),
            name: new.name.trim().to_string(),
            sku: new.sku.trim().to_string(),
            unit_id: new.unit_id,
            min_stock: new.min_stock,
            current_stock: new.current_stock,
            cost_price: new.cost_price,
            image_ref: new.image_ref.filter(|i| !i.trim().is_empty()),
        };
        self.data.products.push(product.clone());

        info!(product_id = %product.id, sku = %product.sku, "product created");
        self.record(
            &actor.user_id,
            AuditAction::ProductCreate,
            format!("Created product {} ({})", product.name, product.sku),
        );
        Ok(product)
    }

    /// Apply a stock change and append it to the ledger.
    ///
    /// With `link_to_finance`, a PENDING transaction worth
    /// `|quantity| × cost_price` is created alongside and cross-linked.
    /// Stock entering (IN, positive ADJUSTMENT) is an expense; stock leaving
    /// is income. A zero-cost product gets no linked transaction.
    pub fn record_movement(
        &mut self,
        actor: &Identity,
        movement: NewMovement,
        link_to_finance: bool,
    ) -> CoreResult<StockMovement> {
        validate_movement_quantity(movement.kind, movement.quantity)?;
        let idx = self.position(EntityKind::Product, &movement.product_id)?;
        let product = &self.data.products[idx];

        let magnitude = movement.quantity.checked_abs().ok_or_else(quantity_too_large)?;
        let delta = movement.kind.stock_delta(movement.quantity);
        let new_stock = product
            .current_stock
            .checked_add(delta)
            .ok_or_else(quantity_too_large)?;
        if new_stock < 0 {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                sku: product.sku.clone(),
                available: product.current_stock,
                requested: magnitude,
            });
        }

        let movement_id = new_id();
        let amount = product
            .cost_price
            .checked_multiply_quantity(magnitude)
            .ok_or_else(quantity_too_large)?;
        let linked = if link_to_finance && amount.is_positive() {
            let kind = if delta > 0 {
                TransactionKind::Expense
            } else {
                TransactionKind::Income
            };
            let verb = match movement.kind {
                MovementKind::In => "Purchase",
                MovementKind::Out => "Sale",
                MovementKind::Adjustment => "Adjustment",
            };
            let new_tx = NewTransaction {
                kind,
                amount,
                date: movement.date,
                category: INVENTORY_CATEGORY.to_string(),
                description: format!("{} of {}", verb, product.name),
                payment_method: INVENTORY_PAYMENT_METHOD.to_string(),
                unit_id: product.unit_id.clone(),
                attachment_ref: None,
            };
            Some(self.prepare_transaction(actor, new_tx, Some(movement_id.clone()))?)
        } else {
            None
        };

        let record = StockMovement {
            id: movement_id,
            product_id: product.id.clone(),
            unit_id: product.unit_id.clone(),
            kind: movement.kind,
            quantity: movement.quantity,
            date: movement.date,
            reason: movement.reason,
            status: ApprovalStatus::Approved,
            linked_transaction_id: linked.as_ref().map(|t| t.id.clone()),
        };
        let sku = product.sku.clone();

        // All checks passed; apply.
        self.data.products[idx].current_stock = new_stock;
        self.data.movements.push(record.clone());
        if let Some(tx) = linked {
            self.data.transactions.insert(0, tx);
        }

        info!(
            movement_id = %record.id,
            product_id = %record.product_id,
            kind = %record.kind,
            quantity = record.quantity,
            stock = new_stock,
            "stock movement recorded"
        );
        let details = match &record.linked_transaction_id {
            Some(tx_id) => format!(
                "{} {} of {} (stock {}), movement {}, transaction {}",
                record.kind, record.quantity, sku, new_stock, record.id, tx_id
            ),
            None => format!(
                "{} {} of {} (stock {}), movement {}",
                record.kind, record.quantity, sku, new_stock, record.id
            ),
        };
        self.record(&actor.user_id, AuditAction::StockMovement, details);
        Ok(record)
    }

    /// Products at or below their minimum stock, optionally for one unit.
    pub fn low_stock(&self, unit_id: Option<&str>) -> Vec<Product> {
        self.data
            .products
            .iter()
            .filter(|p| unit_id.map_or(true, |u| p.unit_id == u))
            .filter(|p| p.is_low_stock())
            .cloned()
            .collect()
    }

    /// Case-insensitive match on name or SKU, optionally for one unit.
    ///
    /// An empty query lists every product in scope.
    pub fn search_products(&self, unit_id: Option<&str>, query: &str) -> CoreResult<Vec<Product>> {
        let needle = validate_search_query(query)?.to_lowercase();

        let found: Vec<Product> = self
            .data
            .products
            .iter()
            .filter(|p| unit_id.map_or(true, |u| p.unit_id == u))
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.sku.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        debug!(query = %needle, count = found.len(), "products searched");
        Ok(found)
    }

    /// Ledger entries for one product, oldest first.
    pub fn movements_for(&self, product_id: &str) -> Vec<StockMovement> {
        self.data
            .movements
            .iter()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect()
    }
}

fn quantity_too_large() -> ValidationError {
    ValidationError::TooLarge {
        field: "quantity".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::dto::NewUnit;
    use crate::money::Money;
    use chrono::NaiveDate;

    fn movement(product_id: &str, kind: MovementKind, quantity: i64) -> NewMovement {
        NewMovement {
            product_id: product_id.into(),
            kind,
            quantity,
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            reason: "test".into(),
        }
    }

    #[test]
    fn test_add_product_validation() {
        let (mut kernel, u1) = kernel_with_unit();
        let base = NewProduct {
            name: "Café".into(),
            sku: "CAFE".into(),
            unit_id: u1.clone(),
            min_stock: 0,
            current_stock: 0,
            cost_price: Money::zero(),
            image_ref: None,
        };
        assert!(kernel.add_product(&admin(), base.clone()).is_ok());

        let negative = NewProduct {
            current_stock: -1,
            ..base.clone()
        };
        assert!(kernel.add_product(&admin(), negative).is_err());

        let ghost_unit = NewProduct {
            unit_id: "ghost".into(),
            ..base
        };
        assert!(matches!(
            kernel.add_product(&admin(), ghost_unit),
            Err(CoreError::NotFound { entity: EntityKind::Unit, .. })
        ));
        assert_eq!(kernel.products().len(), 1);
    }

    #[test]
    fn test_out_beyond_stock_is_refused() {
        let (mut kernel, u1) = kernel_with_unit();
        let pid = add_product(&mut kernel, &u1, 3, 1000);
        let audit_before = kernel.audit_log().len();

        let err = kernel
            .record_movement(&admin(), movement(&pid, MovementKind::Out, 5), true)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 5, .. }
        ));
        assert_eq!(kernel.product(&pid).unwrap().current_stock, 3);
        assert!(kernel.movements().is_empty());
        assert!(kernel.transactions().is_empty());
        assert_eq!(kernel.audit_log().len(), audit_before);
    }

    #[test]
    fn test_oversized_quantity_is_refused() {
        let too_large = |r: CoreResult<StockMovement>| {
            matches!(
                r,
                Err(CoreError::Validation(ValidationError::TooLarge { ref field })) if field == "quantity"
            )
        };
        let (mut kernel, u1) = kernel_with_unit();
        let free = add_product(&mut kernel, &u1, 1, 0);
        let priced = add_product(&mut kernel, &u1, 0, 1000);
        let audit_before = kernel.audit_log().len();

        // Stock 1 + i64::MAX.
        assert!(too_large(kernel.record_movement(
            &admin(),
            movement(&free, MovementKind::In, i64::MAX),
            false
        )));
        // 1000 cents × i64::MAX / 10.
        assert!(too_large(kernel.record_movement(
            &admin(),
            movement(&priced, MovementKind::In, i64::MAX / 10),
            true
        )));
        assert!(too_large(kernel.record_movement(
            &admin(),
            movement(&priced, MovementKind::Adjustment, i64::MIN),
            true
        )));

        assert_eq!(kernel.product(&free).unwrap().current_stock, 1);
        assert_eq!(kernel.product(&priced).unwrap().current_stock, 0);
        assert!(kernel.movements().is_empty());
        assert!(kernel.transactions().is_empty());
        assert_eq!(kernel.audit_log().len(), audit_before);

        // The largest quantity that still fits is accepted.
        let moved = kernel
            .record_movement(&admin(), movement(&free, MovementKind::In, i64::MAX - 1), false)
            .unwrap();
        assert_eq!(moved.quantity, i64::MAX - 1);
        assert_eq!(kernel.product(&free).unwrap().current_stock, i64::MAX);
    }

    #[test]
    fn test_unknown_product() {
        let (mut kernel, _) = kernel_with_unit();
        assert!(matches!(
            kernel.record_movement(&admin(), movement("ghost", MovementKind::In, 1), false),
            Err(CoreError::NotFound { entity: EntityKind::Product, .. })
        ));
    }

    #[test]
    fn test_in_with_link_creates_pending_expense() {
        let (mut kernel, u1) = kernel_with_unit();
        let pid = add_product(&mut kernel, &u1, 0, 1000);

        let recorded = kernel
            .record_movement(&admin(), movement(&pid, MovementKind::In, 5), true)
            .unwrap();

        assert_eq!(kernel.product(&pid).unwrap().current_stock, 5);
        assert_eq!(recorded.status, ApprovalStatus::Approved);
        assert_eq!(recorded.unit_id, u1);

        let tx_id = recorded.linked_transaction_id.clone().unwrap();
        let tx = kernel.transaction(&tx_id).unwrap();
        assert_eq!(tx.kind, TransactionKind::Expense);
        assert_eq!(tx.amount, Money::from_major(50));
        assert_eq!(tx.status, ApprovalStatus::Pending);
        assert_eq!(tx.category, INVENTORY_CATEGORY);
        assert_eq!(tx.unit_id, u1);
        assert_eq!(tx.created_by, admin().user_id);
        assert_eq!(tx.linked_stock_movement_id.as_deref(), Some(recorded.id.as_str()));

        let movement_entries = kernel.audit_by_action(AuditAction::StockMovement);
        assert_eq!(movement_entries.len(), 1);
        assert!(movement_entries[0].details.contains(&tx_id));
        assert!(kernel.audit_by_action(AuditAction::TransCreate).is_empty());
    }

    #[test]
    fn test_system_actor_is_recorded_as_creator() {
        let (mut kernel, u1) = kernel_with_unit();
        let pid = add_product(&mut kernel, &u1, 0, 1000);
        let recorded = kernel
            .record_movement(&Identity::system(), movement(&pid, MovementKind::In, 1), true)
            .unwrap();
        let tx = kernel
            .transaction(recorded.linked_transaction_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(tx.created_by, crate::SYSTEM_ACTOR_ID);
    }

    #[test]
    fn test_without_link_no_transaction() {
        let (mut kernel, u1) = kernel_with_unit();
        let pid = add_product(&mut kernel, &u1, 4, 1000);
        let recorded = kernel
            .record_movement(&admin(), movement(&pid, MovementKind::Out, 4), false)
            .unwrap();
        assert!(recorded.linked_transaction_id.is_none());
        assert_eq!(kernel.product(&pid).unwrap().current_stock, 0);
        assert!(kernel.transactions().is_empty());
    }

    #[test]
    fn test_adjustment_is_signed_delta() {
        let (mut kernel, u1) = kernel_with_unit();
        let pid = add_product(&mut kernel, &u1, 5, 200);

        let down = kernel
            .record_movement(&admin(), movement(&pid, MovementKind::Adjustment, -2), true)
            .unwrap();
        assert_eq!(kernel.product(&pid).unwrap().current_stock, 3);
        let tx = kernel
            .transaction(down.linked_transaction_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(tx.kind, TransactionKind::Income);
        assert_eq!(tx.amount, Money::from_cents(400));

        kernel
            .record_movement(&admin(), movement(&pid, MovementKind::Adjustment, 4), false)
            .unwrap();
        assert_eq!(kernel.product(&pid).unwrap().current_stock, 7);

        assert!(matches!(
            kernel.record_movement(&admin(), movement(&pid, MovementKind::Adjustment, -8), false),
            Err(CoreError::InsufficientStock { available: 7, requested: 8, .. })
        ));
        assert!(kernel
            .record_movement(&admin(), movement(&pid, MovementKind::Adjustment, 0), false)
            .is_err());
    }

    #[test]
    fn test_zero_cost_product_skips_link() {
        let (mut kernel, u1) = kernel_with_unit();
        let pid = add_product(&mut kernel, &u1, 0, 0);
        let recorded = kernel
            .record_movement(&admin(), movement(&pid, MovementKind::In, 3), true)
            .unwrap();
        assert!(recorded.linked_transaction_id.is_none());
        assert!(kernel.transactions().is_empty());
    }

    #[test]
    fn test_low_stock_and_search() {
        let (mut kernel, u1) = kernel_with_unit();
        let u2 = kernel.create_unit(&admin(), NewUnit::named("Filial")).unwrap().id;
        add_product(&mut kernel, &u1, 2, 100); // min_stock 2: low
        add_product(&mut kernel, &u2, 9, 100);

        assert_eq!(kernel.low_stock(None).len(), 1);
        assert!(kernel.low_stock(Some(&u2)).is_empty());

        assert_eq!(kernel.search_products(None, "café").unwrap().len(), 2);
        assert_eq!(kernel.search_products(Some(&u2), "cafe-1").unwrap().len(), 1);
        assert_eq!(kernel.search_products(None, "").unwrap().len(), 2);
        assert!(kernel.search_products(None, "tea").unwrap().is_empty());
    }
}
