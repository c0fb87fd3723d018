/// Board permission resolution
///
/// Decides whether a principal may act on a board, a board collaborator or a
/// collaborator request. Every decision reads the current rows through the
/// caller's unit of work; nothing is cached between requests.
///
/// # Permission Model
///
/// 1. **Shared boards**: readable by anyone, anonymous callers included
/// 2. **Board collaborators**: a `read` row grants reading, a `write` row
///    grants reading and writing
/// 3. **Account owners**: may manage collaborators and collaborator requests
///    on every board of their account
///
/// # Example
///
/// ```no_run
/// use boards_shared::auth::authorization::{require, can_access, AccessMode};
/// use boards_shared::auth::middleware::Principal;
/// use boards_shared::error::DomainError;
/// use boards_shared::models::board::Board;
/// use boards_shared::store::StoreTx;
///
/// async fn check(tx: &mut dyn StoreTx, principal: &Principal, board: &Board) -> Result<(), DomainError> {
///     let allowed = can_access(tx, principal, board, AccessMode::Write).await?;
///     require(principal, allowed)
/// }
/// ```

use axum::http::Method;
use uuid::Uuid;

use super::middleware::Principal;
use crate::error::DomainError;
use crate::models::{
    board::Board, board_collaborator::{BoardCollaborator, Permission},
};
use crate::store::{StoreResult, StoreTx};

/// Access a request needs on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Any collaborator row, or a shared board
    Read,

    /// A `write` collaborator row
    Write,

    /// Any collaborator row; shared boards grant nothing
    Any,
}

impl AccessMode {
    /// Safe methods read, everything else writes
    pub fn for_method(method: &Method) -> Self {
        if is_safe_method(method) {
            AccessMode::Read
        } else {
            AccessMode::Write
        }
    }

    fn is_satisfied_by(&self, row: &BoardCollaborator) -> bool {
        match self {
            AccessMode::Read | AccessMode::Any => row.grants(Permission::Read),
            AccessMode::Write => row.grants(Permission::Write),
        }
    }
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Actions on a single board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardAction {
    Retrieve,
    Update,
    Delete,
    Leave,
}

impl BoardAction {
    fn method(&self) -> Method {
        match self {
            BoardAction::Retrieve => Method::GET,
            BoardAction::Update => Method::PUT,
            BoardAction::Delete => Method::DELETE,
            BoardAction::Leave => Method::POST,
        }
    }
}

/// Actions on a single board collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorAction {
    Retrieve,
    Update,
    Delete,
}

/// Whether `principal` has `mode` access to `board`
pub async fn can_access(
    tx: &mut dyn StoreTx,
    principal: &Principal,
    board: &Board,
    mode: AccessMode,
) -> StoreResult<bool> {
    if mode == AccessMode::Read && board.is_shared {
        return Ok(true);
    }

    let Some(user_id) = principal.user_id() else {
        return Ok(false);
    };

    let row = tx.board_collaborator_for_user(board.id, user_id).await?;

    Ok(row.map_or(false, |row| mode.is_satisfied_by(&row)))
}

/// Whether `principal` owns the account
pub async fn is_account_owner(
    tx: &mut dyn StoreTx,
    principal: &Principal,
    account_id: Uuid,
) -> StoreResult<bool> {
    let Some(user_id) = principal.user_id() else {
        return Ok(false);
    };

    let membership = tx.account_collaborator(account_id, user_id).await?;

    Ok(membership.map_or(false, |m| m.is_owner))
}

/// Board object rule
///
/// The mode comes from the action's method; a shared board passes reads.
/// Leaving only needs some collaborator row.
pub async fn can_access_board(
    tx: &mut dyn StoreTx,
    principal: &Principal,
    board: &Board,
    action: BoardAction,
) -> StoreResult<bool> {
    let mode = AccessMode::for_method(&action.method());

    if mode == AccessMode::Read && board.is_shared {
        return Ok(true);
    }

    if principal.is_anonymous() {
        return Ok(false);
    }

    let mode = match action {
        BoardAction::Leave => AccessMode::Any,
        _ => mode,
    };

    can_access(tx, principal, board, mode).await
}

/// Board collection rule: anonymous callers may neither list nor write
pub fn can_use_board_collection(principal: &Principal, method: &Method, is_list: bool) -> bool {
    !(principal.is_anonymous() && (is_list || !is_safe_method(method)))
}

/// Collaborator collection rule for list requests
///
/// Anonymous callers may list only when filtering by board; the board itself
/// must still be readable.
pub fn can_list_collaborators(principal: &Principal, board_filter: Option<Uuid>) -> bool {
    !principal.is_anonymous() || board_filter.is_some()
}

/// Collaborator collection rule for create requests
///
/// Every target board needs write access or account ownership; one failing
/// board denies the whole payload.
pub async fn can_add_collaborators(
    tx: &mut dyn StoreTx,
    principal: &Principal,
    boards: &[Board],
) -> StoreResult<bool> {
    if principal.is_anonymous() {
        return Ok(false);
    }

    for board in boards {
        if !can_manage_board_collaborators(tx, principal, board, AccessMode::Write).await? {
            return Ok(false);
        }
    }

    Ok(true)
}

async fn can_manage_board_collaborators(
    tx: &mut dyn StoreTx,
    principal: &Principal,
    board: &Board,
    mode: AccessMode,
) -> StoreResult<bool> {
    if can_access(tx, principal, board, mode).await? {
        return Ok(true);
    }

    is_account_owner(tx, principal, board.account_id).await
}

/// Collaborator object rule
///
/// Deleting is open to the collaborator itself, board writers and account
/// owners. Reading and updating follow board access, or account ownership.
pub async fn can_access_collaborator(
    tx: &mut dyn StoreTx,
    principal: &Principal,
    collaborator: &BoardCollaborator,
    board: &Board,
    action: CollaboratorAction,
) -> StoreResult<bool> {
    match action {
        CollaboratorAction::Delete => {
            if principal.is_anonymous() {
                return Ok(false);
            }
            if collaborator.user_id.is_some() && collaborator.user_id == principal.user_id() {
                return Ok(true);
            }
            can_manage_board_collaborators(tx, principal, board, AccessMode::Write).await
        }
        CollaboratorAction::Retrieve => {
            can_manage_board_collaborators(tx, principal, board, AccessMode::Read).await
        }
        CollaboratorAction::Update => {
            can_manage_board_collaborators(tx, principal, board, AccessMode::Write).await
        }
    }
}

/// Collaborator request rule: only owners of the board's account
pub async fn can_manage_request(
    tx: &mut dyn StoreTx,
    principal: &Principal,
    board: &Board,
) -> StoreResult<bool> {
    is_account_owner(tx, principal, board.account_id).await
}

/// Turns a decision into an error
///
/// Anonymous callers get `Unauthenticated`, known users `PermissionDenied`.
pub fn require(principal: &Principal, allowed: bool) -> Result<(), DomainError> {
    match (allowed, principal) {
        (true, _) => Ok(()),
        (false, Principal::Anonymous) => Err(DomainError::Unauthenticated),
        (false, Principal::User(_)) => Err(DomainError::PermissionDenied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        account::CreateAccount,
        account_collaborator::CreateAccountCollaborator,
        board::CreateBoard,
        board_collaborator::{CollaboratorTarget, CreateBoardCollaborator},
        user::{CreateUser, User},
    };
    use crate::store::{memory::MemoryStore, Store};

    struct Fixture {
        owner: User,
        reader: User,
        writer: User,
        stranger: User,
        board: Board,
        shared_board: Board,
    }

    fn create_user(username: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    fn principal(user: &User) -> Principal {
        Principal::user(user.id, user.username.clone())
    }

    async fn fixture(tx: &mut dyn StoreTx) -> Fixture {
        let owner = tx.insert_user(create_user("owner")).await.unwrap();
        let reader = tx.insert_user(create_user("reader")).await.unwrap();
        let writer = tx.insert_user(create_user("writer")).await.unwrap();
        let stranger = tx.insert_user(create_user("stranger")).await.unwrap();

        let account = tx
            .insert_account(CreateAccount {
                name: "owner".to_string(),
                slug: "owner".to_string(),
                logo_color: None,
                created_by: owner.id,
            })
            .await
            .unwrap();
        tx.insert_account_collaborator(CreateAccountCollaborator::owner(account.id, owner.id))
            .await
            .unwrap();

        let board = tx
            .insert_board(CreateBoard {
                name: "Private".to_string(),
                account_id: account.id,
                created_by: owner.id,
                is_shared: false,
                color: None,
            })
            .await
            .unwrap();
        let shared_board = tx
            .insert_board(CreateBoard {
                name: "Shared".to_string(),
                account_id: account.id,
                created_by: owner.id,
                is_shared: true,
                color: None,
            })
            .await
            .unwrap();

        for (user, permission) in [(&reader, Permission::Read), (&writer, Permission::Write)] {
            tx.insert_board_collaborator(CreateBoardCollaborator::new(
                board.id,
                CollaboratorTarget::User(user.id),
                permission,
                Some(owner.id),
            ))
            .await
            .unwrap();
        }

        Fixture {
            owner,
            reader,
            writer,
            stranger,
            board,
            shared_board,
        }
    }

    #[test]
    fn test_mode_for_method() {
        assert_eq!(AccessMode::for_method(&Method::GET), AccessMode::Read);
        assert_eq!(AccessMode::for_method(&Method::HEAD), AccessMode::Read);
        assert_eq!(AccessMode::for_method(&Method::POST), AccessMode::Write);
        assert_eq!(AccessMode::for_method(&Method::DELETE), AccessMode::Write);
    }

    #[tokio::test]
    async fn test_shared_board_is_readable_by_anyone() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let f = fixture(tx.as_mut()).await;

        let anonymous = Principal::Anonymous;
        assert!(can_access(tx.as_mut(), &anonymous, &f.shared_board, AccessMode::Read).await.unwrap());
        assert!(!can_access(tx.as_mut(), &anonymous, &f.shared_board, AccessMode::Write).await.unwrap());
        assert!(!can_access(tx.as_mut(), &anonymous, &f.board, AccessMode::Read).await.unwrap());
        assert!(can_access_board(tx.as_mut(), &principal(&f.stranger), &f.shared_board, BoardAction::Retrieve)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_collaborator_rows_grant_access() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let f = fixture(tx.as_mut()).await;

        let reader = principal(&f.reader);
        let writer = principal(&f.writer);
        let stranger = principal(&f.stranger);

        assert!(can_access(tx.as_mut(), &reader, &f.board, AccessMode::Read).await.unwrap());
        assert!(!can_access(tx.as_mut(), &reader, &f.board, AccessMode::Write).await.unwrap());
        assert!(can_access(tx.as_mut(), &writer, &f.board, AccessMode::Write).await.unwrap());
        assert!(!can_access(tx.as_mut(), &stranger, &f.board, AccessMode::Read).await.unwrap());
        assert!(!can_access(tx.as_mut(), &stranger, &f.shared_board, AccessMode::Any).await.unwrap());
    }

    #[tokio::test]
    async fn test_leave_needs_any_row() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let f = fixture(tx.as_mut()).await;

        assert!(can_access_board(tx.as_mut(), &principal(&f.reader), &f.board, BoardAction::Leave)
            .await
            .unwrap());
        assert!(!can_access_board(tx.as_mut(), &principal(&f.reader), &f.board, BoardAction::Update)
            .await
            .unwrap());
        assert!(!can_access_board(tx.as_mut(), &Principal::Anonymous, &f.board, BoardAction::Leave)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_account_owner_manages_collaborators() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let f = fixture(tx.as_mut()).await;
        let owner = principal(&f.owner);

        assert!(is_account_owner(tx.as_mut(), &owner, f.board.account_id).await.unwrap());
        assert!(!is_account_owner(tx.as_mut(), &principal(&f.writer), f.board.account_id).await.unwrap());

        let boards = vec![f.board.clone(), f.shared_board.clone()];
        assert!(can_add_collaborators(tx.as_mut(), &owner, &boards).await.unwrap());
        assert!(!can_add_collaborators(tx.as_mut(), &principal(&f.writer), &boards).await.unwrap());
        assert!(can_add_collaborators(tx.as_mut(), &principal(&f.writer), &boards[..1]).await.unwrap());
        assert!(!can_add_collaborators(tx.as_mut(), &Principal::Anonymous, &boards[..1]).await.unwrap());
    }

    #[tokio::test]
    async fn test_collaborator_self_removal() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let f = fixture(tx.as_mut()).await;

        let row = tx
            .board_collaborator_for_user(f.board.id, f.reader.id)
            .await
            .unwrap()
            .unwrap();

        for (who, expected) in [
            (principal(&f.reader), true),
            (principal(&f.writer), true),
            (principal(&f.owner), true),
            (principal(&f.stranger), false),
            (Principal::Anonymous, false),
        ] {
            let allowed = can_access_collaborator(tx.as_mut(), &who, &row, &f.board, CollaboratorAction::Delete)
                .await
                .unwrap();
            assert_eq!(allowed, expected, "{:?}", who);
        }

        assert!(!can_access_collaborator(
            tx.as_mut(),
            &principal(&f.reader),
            &row,
            &f.board,
            CollaboratorAction::Update
        )
        .await
        .unwrap());
    }

    #[test]
    fn test_collection_rules() {
        let user = Principal::user(Uuid::new_v4(), "juan");

        assert!(!can_use_board_collection(&Principal::Anonymous, &Method::GET, true));
        assert!(!can_use_board_collection(&Principal::Anonymous, &Method::POST, false));
        assert!(can_use_board_collection(&Principal::Anonymous, &Method::GET, false));
        assert!(can_use_board_collection(&user, &Method::GET, true));

        assert!(!can_list_collaborators(&Principal::Anonymous, None));
        assert!(can_list_collaborators(&Principal::Anonymous, Some(Uuid::new_v4())));
        assert!(can_list_collaborators(&user, None));
    }

    #[test]
    fn test_require() {
        assert!(require(&Principal::Anonymous, true).is_ok());
        assert!(matches!(
            require(&Principal::Anonymous, false),
            Err(DomainError::Unauthenticated)
        ));
        assert!(matches!(
            require(&Principal::user(Uuid::new_v4(), "juan"), false),
            Err(DomainError::PermissionDenied)
        ));
    }
}
