//! The single place the ownership/admin/grant/public-writable predicate
//! lives. Every handler derives its gate from here instead of re-implementing
//! the check inline.

use stockpile_db::models::{InventoryRow, InventorySummaryRow};

use crate::middleware::CurrentUser;

/// Derived per-request permissions; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub read: bool,
    pub write: bool,
    pub manage: bool,
    pub delete: bool,
}

/// Capability set for an actor over an inventory. `has_grant` is whether an
/// explicit access grant exists for this (inventory, actor) pair.
pub fn capabilities(
    actor: Option<&CurrentUser>,
    inventory: &InventoryRow,
    has_grant: bool,
) -> Capabilities {
    derive(
        actor,
        &inventory.owner_id,
        inventory.is_public_writable,
        has_grant,
    )
}

/// Same derivation over a listing row, which already carries the viewer's
/// grant membership.
pub fn summary_capabilities(
    actor: Option<&CurrentUser>,
    row: &InventorySummaryRow,
) -> Capabilities {
    derive(
        actor,
        &row.owner_id,
        row.is_public_writable,
        row.viewer_has_grant,
    )
}

fn derive(
    actor: Option<&CurrentUser>,
    owner_id: &str,
    public_writable: bool,
    has_grant: bool,
) -> Capabilities {
    let Some(actor) = actor else {
        // Anonymous: read-only.
        return Capabilities {
            read: true,
            write: false,
            manage: false,
            delete: false,
        };
    };

    let is_owner = actor.id.to_string() == owner_id;
    // Admin is re-checked at every gate, never folded into the grant set.
    let is_admin = actor.is_admin;

    Capabilities {
        read: true,
        write: is_owner || public_writable || has_grant || is_admin,
        manage: is_owner || is_admin,
        delete: is_owner || is_admin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(is_admin: bool) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "someone".into(),
            is_admin,
        }
    }

    fn inventory(owner: &CurrentUser, public_writable: bool) -> InventoryRow {
        InventoryRow {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.id.to_string(),
            title: "tools".into(),
            description: None,
            category: None,
            is_public_writable: public_writable,
            version: 1,
        }
    }

    #[test]
    fn anonymous_can_only_read() {
        let owner = user(false);
        let inv = inventory(&owner, true);

        let caps = capabilities(None, &inv, false);
        assert!(caps.read);
        assert!(!caps.write);
        assert!(!caps.manage);
        assert!(!caps.delete);
    }

    #[test]
    fn owner_holds_every_capability() {
        let owner = user(false);
        let inv = inventory(&owner, false);

        let caps = capabilities(Some(&owner), &inv, false);
        assert!(caps.read && caps.write && caps.manage && caps.delete);
    }

    #[test]
    fn admin_holds_every_capability_on_foreign_inventory() {
        let owner = user(false);
        let admin = user(true);
        let inv = inventory(&owner, false);

        let caps = capabilities(Some(&admin), &inv, false);
        assert!(caps.read && caps.write && caps.manage && caps.delete);
    }

    #[test]
    fn public_writable_grants_write_but_nothing_more() {
        let owner = user(false);
        let visitor = user(false);
        let inv = inventory(&owner, true);

        let caps = capabilities(Some(&visitor), &inv, false);
        assert!(caps.write);
        assert!(!caps.manage);
        assert!(!caps.delete);
    }

    #[test]
    fn explicit_grant_gives_write_only() {
        let owner = user(false);
        let grantee = user(false);
        let inv = inventory(&owner, false);

        let caps = capabilities(Some(&grantee), &inv, true);
        assert!(caps.write);
        assert!(!caps.manage);
        assert!(!caps.delete);
    }

    #[test]
    fn no_other_path_grants_write() {
        // Not owner, not public-writable, no grant, not admin.
        let owner = user(false);
        let stranger = user(false);
        let inv = inventory(&owner, false);

        let caps = capabilities(Some(&stranger), &inv, false);
        assert!(caps.read);
        assert!(!caps.write);
        assert!(!caps.manage);
        assert!(!caps.delete);
    }
}
