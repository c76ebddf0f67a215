//! Account repository for chart of accounts database operations.

use std::collections::HashMap;

use chrono::Utc;
use mizan_core::accounts::{
    Account, AccountBalance, AccountError, AccountNode, AccountService, AccountTree,
    CreateAccountInput, ParentState, UpdateAccountInput,
};
use mizan_core::ledger::AccountInfo;
use mizan_shared::AccountId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{DbResultExt, is_unique_violation, ledger};
use crate::entities::{accounts, journal_lines};

/// Account repository for the chart of accounts.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account under an optional parent.
    ///
    /// # Errors
    ///
    /// - `InvalidAccountInput` for an empty code or name
    /// - `InvalidParent` if the parent is missing, inactive, or has lines
    /// - `DuplicateCode` if the code is taken (unique index)
    pub async fn create_account(&self, input: CreateAccountInput) -> Result<Account, AccountError> {
        let input = AccountService::validate_create(input)?;
        let txn = self.db.begin().await.or_db(AccountError::Database)?;

        if let Some(parent_id) = input.parent_id {
            let parent = parent_state(&txn, parent_id).await?;
            AccountService::validate_parent(parent_id, parent)?;
        }

        let now = Utc::now();
        let model = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            code: Set(input.code.clone()),
            name: Set(input.name),
            parent_id: Set(input.parent_id.map(AccountId::into_inner)),
            is_active: Set(true),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = match model.insert(&txn).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                warn!(code = %input.code, "duplicate account code");
                return Err(AccountError::DuplicateCode(input.code));
            }
            Err(e) => return Err(e).or_db(AccountError::Database),
        };
        txn.commit().await.or_db(AccountError::Database)?;

        info!(account_id = %model.id, code = %model.code, "account created");
        Ok(to_account(model))
    }

    /// Renames and/or (de)activates an account.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound`
    /// - `StaleVersion` if `expected_version` is stale or a concurrent write won
    /// - `AccountHasBalance` when deactivating a leaf with a posted balance
    /// - `InvalidParent` when re-activating under an inactive parent
    pub async fn update_account(
        &self,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<Account, AccountError> {
        let txn = self.db.begin().await.or_db(AccountError::Database)?;
        let current = find_locked(&txn, id).await?;
        AccountService::check_version(id, &input, current.version)?;

        let name = input
            .name
            .as_deref()
            .map(AccountService::validate_name)
            .transpose()?;

        match input.is_active {
            Some(false) if current.is_active => {
                let is_leaf = child_count(&txn, id).await? == 0;
                let balance = if is_leaf {
                    ledger::posted_totals(&txn, &[id])
                        .await
                        .or_db(AccountError::Database)?
                        .delta()
                } else {
                    0
                };
                AccountService::validate_deactivation(id, is_leaf, balance)?;
            }
            Some(true) if !current.is_active => {
                let parent = match current.parent_id {
                    Some(parent_id) => parent_state(&txn, parent_id.into()).await?,
                    None => None,
                };
                AccountService::validate_activation(parent)?;
            }
            _ => {}
        }

        let mut update = accounts::Entity::update_many()
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(
                accounts::Column::Version,
                Expr::col(accounts::Column::Version).add(1),
            )
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::Version.eq(current.version));
        if let Some(name) = name {
            update = update.col_expr(accounts::Column::Name, Expr::value(name));
        }
        if let Some(is_active) = input.is_active {
            update = update.col_expr(accounts::Column::IsActive, Expr::value(is_active));
        }

        let result = update.exec(&txn).await.or_db(AccountError::Database)?;
        if result.rows_affected == 0 {
            warn!(account_id = %id, "account update lost a concurrent write");
            return Err(AccountError::StaleVersion(id));
        }

        let updated = find(&txn, id).await?;
        txn.commit().await.or_db(AccountError::Database)?;

        info!(account_id = %id, is_active = updated.is_active, "account updated");
        Ok(to_account(updated))
    }

    /// Removes an account that nothing references.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound`
    /// - `AccountInUse` if lines reference it or a descendant
    /// - `AccountHasChildren` otherwise, if it has children
    pub async fn delete_account(&self, id: AccountId) -> Result<(), AccountError> {
        let txn = self.db.begin().await.or_db(AccountError::Database)?;
        find_locked(&txn, id).await?;

        let tree = load_tree(&txn).await?;
        let subtree: Vec<Uuid> = tree.subtree(id).into_iter().map(AccountId::into_inner).collect();
        let line_count = journal_lines::Entity::find()
            .filter(journal_lines::Column::AccountId.is_in(subtree))
            .count(&txn)
            .await
            .or_db(AccountError::Database)?;
        let children = u64::try_from(tree.children(id).len()).unwrap_or(u64::MAX);
        AccountService::validate_delete(id, line_count, children)?;

        accounts::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .or_db(AccountError::Database)?;
        txn.commit().await.or_db(AccountError::Database)?;

        info!(account_id = %id, "account deleted");
        Ok(())
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` or a database error.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AccountError> {
        find(&self.db, id).await.map(to_account)
    }

    /// Lists accounts ordered by code, optionally by active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(&self, active: Option<bool>) -> Result<Vec<Account>, AccountError> {
        let mut query = accounts::Entity::find().order_by_asc(accounts::Column::Code);
        if let Some(active) = active {
            query = query.filter(accounts::Column::IsActive.eq(active));
        }
        let models = query.all(&self.db).await.or_db(AccountError::Database)?;
        Ok(models.into_iter().map(to_account).collect())
    }

    /// The chart as an ordered forest.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn tree(&self) -> Result<Vec<AccountNode>, AccountError> {
        Ok(load_tree(&self.db).await?.forest())
    }

    /// True if the account has no children.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` or a database error.
    pub async fn is_leaf(&self, id: AccountId) -> Result<bool, AccountError> {
        find(&self.db, id).await?;
        Ok(child_count(&self.db, id).await? == 0)
    }

    /// Posted base balance of an account and all of its descendants.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` or a database error.
    pub async fn account_balance(&self, id: AccountId) -> Result<AccountBalance, AccountError> {
        find(&self.db, id).await?;
        let tree = load_tree(&self.db).await?;
        let totals = ledger::posted_totals(&self.db, &tree.subtree(id))
            .await
            .or_db(AccountError::Database)?;
        Ok(AccountBalance {
            account_id: id,
            debit: totals.base_debit,
            credit: totals.base_credit,
        })
    }
}

pub(crate) fn to_account(model: accounts::Model) -> Account {
    Account {
        id: model.id.into(),
        code: model.code,
        name: model.name,
        parent_id: model.parent_id.map(AccountId::from),
        is_active: model.is_active,
        version: model.version,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

async fn find<C: ConnectionTrait>(conn: &C, id: AccountId) -> Result<accounts::Model, AccountError> {
    accounts::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .or_db(AccountError::Database)?
        .ok_or(AccountError::AccountNotFound(id))
}

/// Reads the account and holds its row against concurrent posting.
async fn find_locked<C: ConnectionTrait>(conn: &C, id: AccountId) -> Result<accounts::Model, AccountError> {
    accounts::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .or_db(AccountError::Database)?
        .ok_or(AccountError::AccountNotFound(id))
}

async fn child_count<C: ConnectionTrait>(conn: &C, id: AccountId) -> Result<u64, AccountError> {
    accounts::Entity::find()
        .filter(accounts::Column::ParentId.eq(id.into_inner()))
        .count(conn)
        .await
        .or_db(AccountError::Database)
}

async fn parent_state<C: ConnectionTrait>(
    conn: &C,
    parent_id: AccountId,
) -> Result<Option<ParentState>, AccountError> {
    // Posting holds line accounts shared, so the line count below cannot
    // move while the parent row is held.
    let Some(parent) = accounts::Entity::find_by_id(parent_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .or_db(AccountError::Database)?
    else {
        return Ok(None);
    };
    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::AccountId.eq(parent.id))
        .count(conn)
        .await
        .or_db(AccountError::Database)?;
    Ok(Some(ParentState {
        id: parent_id,
        is_active: parent.is_active,
        has_lines: lines > 0,
    }))
}

async fn load_tree<C: ConnectionTrait>(conn: &C) -> Result<AccountTree, AccountError> {
    let models = accounts::Entity::find()
        .all(conn)
        .await
        .or_db(AccountError::Database)?;
    Ok(AccountTree::build(models.into_iter().map(to_account).collect()))
}

/// Postability facts for the given accounts; unknown ids are absent.
///
/// The accounts stay share-locked until the transaction ends, so they cannot
/// gain children or be deactivated while lines against them are written.
pub(crate) async fn account_infos<C: ConnectionTrait>(
    conn: &C,
    ids: &[AccountId],
) -> Result<HashMap<AccountId, AccountInfo>, sea_orm::DbErr> {
    let ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
    let found = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids.clone()))
        .order_by_asc(accounts::Column::Id)
        .lock_shared()
        .all(conn)
        .await?;
    let parents: Vec<Option<Uuid>> = accounts::Entity::find()
        .filter(accounts::Column::ParentId.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|child| child.parent_id)
        .collect();

    Ok(found
        .into_iter()
        .map(|a| {
            let info = AccountInfo {
                id: a.id.into(),
                is_active: a.is_active,
                is_leaf: !parents.contains(&Some(a.id)),
            };
            (info.id, info)
        })
        .collect())
}

/// Resolves account codes to ids, skipping unknown codes.
pub(crate) async fn ids_by_code<C: ConnectionTrait>(
    conn: &C,
    codes: &[&str],
) -> Result<HashMap<String, AccountId>, sea_orm::DbErr> {
    let found = accounts::Entity::find()
        .filter(accounts::Column::Code.is_in(codes.iter().copied()))
        .all(conn)
        .await?;
    Ok(found.into_iter().map(|a| (a.code, a.id.into())).collect())
}
