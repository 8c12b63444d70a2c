//! LDAP operation handlers.
//!
//! Binds map the bind DN to a username and delegate to the shared
//! authentication service; searches route by objectClass, fetch
//! candidates through the store, and apply the in-memory matcher as
//! the residual filter over materialized entries. All other operations
//! are refused.

use std::sync::Arc;

use ldap3_proto::proto::{
    LdapBindCred, LdapBindRequest, LdapBindResponse, LdapFilter, LdapMsg, LdapOp, LdapResult,
    LdapResultCode, LdapSearchRequest,
};
use ldap3_proto::simple::DisconnectionNotice;
use roster_auth::{AuthError, AuthService};
use roster_model::{Group, User};
use roster_storage::{GroupStore, UserStore};
use tokio::sync::RwLock;

use crate::attrs::AttributeMapper;
use crate::config::LdapSettings;
use crate::dn::extract_username;
use crate::entry::{group_entry, user_entry, LdapEntry};
use crate::filter::{matches, Evaluator, Filter, FilterError};

/// The outcome of handling one LDAP message.
pub enum LdapResponse {
    /// The client unbound; close the connection without responding.
    Unbind,
    /// Send the notice and close the connection.
    Disconnect(LdapMsg),
    /// A bind completed: the new bound identity (None after a failed
    /// bind, per RFC 4511 the connection reverts to anonymous) and the
    /// response to send.
    Bind(Option<String>, LdapMsg),
    /// Send the messages and keep the connection open.
    Respond(Vec<LdapMsg>),
}

/// Handles LDAP operations against the directory.
pub struct LdapHandler {
    users: Arc<dyn UserStore>,
    groups: Arc<dyn GroupStore>,
    auth: Arc<AuthService>,
    settings: Arc<RwLock<LdapSettings>>,
}

impl LdapHandler {
    /// Creates a handler over the shared stores, authentication
    /// service and runtime settings.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        groups: Arc<dyn GroupStore>,
        auth: Arc<AuthService>,
        settings: Arc<RwLock<LdapSettings>>,
    ) -> Self {
        Self {
            users,
            groups,
            auth,
            settings,
        }
    }

    /// Handles one protocol message.
    pub async fn handle_message(&self, msg: LdapMsg) -> LdapResponse {
        match msg.op {
            LdapOp::BindRequest(req) => self.handle_bind(msg.msgid, req).await,
            LdapOp::SearchRequest(req) => self.handle_search(msg.msgid, req).await,
            LdapOp::UnbindRequest => LdapResponse::Unbind,
            op => {
                tracing::debug!(?op, "refusing unsupported operation");
                LdapResponse::Disconnect(DisconnectionNotice::gen(
                    LdapResultCode::UnwillingToPerform,
                    "operation not supported",
                ))
            }
        }
    }

    /// Handles a simple bind.
    ///
    /// Every code path produces exactly one bind response, and every
    /// failure is `invalidCredentials`: the client cannot tell a bad
    /// DN from an unknown user, a wrong password or a disabled
    /// account.
    async fn handle_bind(&self, msgid: i32, req: LdapBindRequest) -> LdapResponse {
        let settings = self.settings.read().await.clone();
        let password = match &req.cred {
            LdapBindCred::Simple(password) => password,
            LdapBindCred::SASL(_) => {
                tracing::info!(dn = %req.dn, "ldap bind rejected: sasl not supported");
                return LdapResponse::Bind(
                    None,
                    bind_response(msgid, LdapResultCode::InvalidCredentials),
                );
            }
        };

        tracing::info!(dn = %req.dn, "ldap bind attempt");

        let username = match extract_username(&req.dn, &settings.base_dn, settings.mode) {
            Ok(name) => name,
            Err(err) => {
                tracing::info!(dn = %req.dn, %err, "ldap bind rejected: bad dn");
                return LdapResponse::Bind(
                    None,
                    bind_response(msgid, LdapResultCode::InvalidCredentials),
                );
            }
        };

        match self.auth.authenticate(&username, password).await {
            Ok(user) => {
                tracing::info!(username = %user.username, "ldap bind success");
                LdapResponse::Bind(
                    Some(user.username),
                    bind_response(msgid, LdapResultCode::Success),
                )
            }
            Err(AuthError::Storage(err)) => {
                tracing::error!(%username, %err, "ldap bind store failure");
                LdapResponse::Bind(
                    None,
                    bind_response(msgid, LdapResultCode::InvalidCredentials),
                )
            }
            Err(_) => {
                tracing::info!(%username, "ldap bind rejected");
                LdapResponse::Bind(
                    None,
                    bind_response(msgid, LdapResultCode::InvalidCredentials),
                )
            }
        }
    }

    /// Handles a search.
    ///
    /// The filter routes fetch selection by its first objectClass
    /// term; users are enumerated before groups, each materialized
    /// entry passes through the residual in-memory matcher, and
    /// accumulation stops at the size limit (0 means unlimited).
    /// Scope and base are accepted but do not affect selection.
    async fn handle_search(&self, msgid: i32, req: LdapSearchRequest) -> LdapResponse {
        let settings = self.settings.read().await.clone();
        let mapper = AttributeMapper::new(settings.mode);

        tracing::info!(
            base = %req.base,
            scope = ?req.scope,
            filter = ?req.filter,
            sizelimit = req.sizelimit,
            "ldap search"
        );

        let filter = match wire_filter_to_ast(&req.filter) {
            Ok(filter) => filter,
            Err(err) => {
                tracing::info!(%err, "ldap search rejected: bad filter");
                return LdapResponse::Respond(vec![search_done(
                    msgid,
                    LdapResultCode::ProtocolError,
                )]);
            }
        };

        let (search_users, search_groups) = match filter.as_ref().and_then(Filter::first_object_class)
        {
            Some(class) => (
                mapper.is_user_object_class(class),
                mapper.is_group_object_class(class),
            ),
            None => (true, true),
        };

        let size_limit = usize::try_from(req.sizelimit).unwrap_or(0);
        let mut entries: Vec<LdapEntry> = Vec::new();

        if search_users {
            let users = match self.fetch_users(filter.as_ref(), &mapper).await {
                Ok(users) => users,
                Err(code) => {
                    return LdapResponse::Respond(vec![search_done(msgid, code)]);
                }
            };
            collect_entries(
                users.iter().map(|u| user_entry(u, &settings.base_dn, settings.mode)),
                filter.as_ref(),
                size_limit,
                &mut entries,
            );
        }

        if search_groups && (size_limit == 0 || entries.len() < size_limit) {
            let groups: Vec<Group> = match self.groups.all_groups().await {
                Ok(groups) => groups,
                Err(err) => {
                    tracing::error!(%err, "ldap search failed to query groups");
                    return LdapResponse::Respond(vec![search_done(msgid, LdapResultCode::Other)]);
                }
            };
            collect_entries(
                groups.iter().map(|g| group_entry(g, &settings.base_dn, settings.mode)),
                filter.as_ref(),
                size_limit,
                &mut entries,
            );
        }

        tracing::info!(results = entries.len(), "ldap search completed");

        let mut responses: Vec<LdapMsg> = entries
            .into_iter()
            .map(|entry| LdapMsg {
                msgid,
                op: LdapOp::SearchResultEntry(entry.into_result_entry(&req.attrs)),
                ctrl: Vec::new(),
            })
            .collect();
        responses.push(search_done(msgid, LdapResultCode::Success));

        LdapResponse::Respond(responses)
    }

    /// Fetches user candidates, using the relational lowering of the
    /// filter for the primary cut where it applies.
    async fn fetch_users(
        &self,
        filter: Option<&Filter>,
        mapper: &AttributeMapper,
    ) -> Result<Vec<User>, LdapResultCode> {
        let result = match filter {
            Some(filter) => match Evaluator::new(mapper).evaluate(filter) {
                Ok(predicate) => self.users.find_users(&predicate).await,
                // A pure objectClass filter selects every row.
                Err(FilterError::EmptyPredicate) => self.users.all_users().await,
                Err(err) => {
                    tracing::info!(%err, "ldap search filter does not lower");
                    return Err(LdapResultCode::Other);
                }
            },
            None => self.users.all_users().await,
        };

        result.map_err(|err| {
            tracing::error!(%err, "ldap search failed to query users");
            LdapResultCode::Other
        })
    }
}

/// Translates the wire filter into the AST, treating `(objectClass=*)`
/// as match-all (no residual filter).
fn wire_filter_to_ast(wire: &LdapFilter) -> Result<Option<Filter>, FilterError> {
    if let LdapFilter::Present(attr) = wire {
        if attr.eq_ignore_ascii_case("objectClass") {
            return Ok(None);
        }
    }
    Filter::try_from(wire).map(Some)
}

/// Applies the residual filter and the size limit while accumulating
/// entries.
fn collect_entries(
    candidates: impl Iterator<Item = LdapEntry>,
    filter: Option<&Filter>,
    size_limit: usize,
    entries: &mut Vec<LdapEntry>,
) {
    for entry in candidates {
        if size_limit > 0 && entries.len() >= size_limit {
            break;
        }
        if filter.is_none_or(|f| matches(f, &entry)) {
            entries.push(entry);
        }
    }
}

fn bind_response(msgid: i32, code: LdapResultCode) -> LdapMsg {
    LdapMsg {
        msgid,
        op: LdapOp::BindResponse(LdapBindResponse {
            res: LdapResult {
                code,
                matcheddn: String::new(),
                message: String::new(),
                referral: Vec::new(),
            },
            saslcreds: None,
        }),
        ctrl: Vec::new(),
    }
}

fn search_done(msgid: i32, code: LdapResultCode) -> LdapMsg {
    LdapMsg {
        msgid,
        op: LdapOp::SearchResultDone(LdapResult {
            code,
            matcheddn: String::new(),
            message: String::new(),
            referral: Vec::new(),
        }),
        ctrl: Vec::new(),
    }
}
