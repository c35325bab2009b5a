//! One-shot completion handles.
//!
//! A completion is moved into the registry when a request is issued and moved
//! out again exactly once, so it can never run twice.

use std::fmt;

use crate::errors::StatusCode;
use crate::kinds::RequestKind;

pub type StatusFn = Box<dyn FnOnce(StatusCode) + Send>;
/// `(status, open_id, access_token)`
pub type AuthFn = Box<dyn FnOnce(StatusCode, Option<String>, Option<String>) + Send>;
/// `(status, nickname, head_img_url)`
pub type UserInfoFn = Box<dyn FnOnce(StatusCode, Option<String>, Option<String>) + Send>;
/// `(status, message)`
pub type ProgramFn = Box<dyn FnOnce(StatusCode, Option<String>) + Send>;

/// Decoded values handed to a completion.
///
/// Each completion shape reads only the fields it declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub open_id: Option<String>,
    pub access_token: Option<String>,
    pub nickname: Option<String>,
    pub head_img_url: Option<String>,
    pub message: Option<String>,
}

impl Reply {
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Callback shapes, one per family of request kinds.
pub enum Completion {
    Status(StatusFn),
    Auth(AuthFn),
    UserInfo(UserInfoFn),
    Program(ProgramFn),
}

impl Completion {
    pub fn status<F>(f: F) -> Self
    where
        F: FnOnce(StatusCode) + Send + 'static,
    {
        Self::Status(Box::new(f))
    }

    pub fn auth<F>(f: F) -> Self
    where
        F: FnOnce(StatusCode, Option<String>, Option<String>) + Send + 'static,
    {
        Self::Auth(Box::new(f))
    }

    pub fn user_info<F>(f: F) -> Self
    where
        F: FnOnce(StatusCode, Option<String>, Option<String>) + Send + 'static,
    {
        Self::UserInfo(Box::new(f))
    }

    pub fn program<F>(f: F) -> Self
    where
        F: FnOnce(StatusCode, Option<String>) + Send + 'static,
    {
        Self::Program(Box::new(f))
    }

    /// Whether this shape is the one `kind` expects.
    pub fn fits(&self, kind: RequestKind) -> bool {
        match self {
            Self::Auth(_) => kind == RequestKind::Auth,
            Self::UserInfo(_) => kind == RequestKind::UserInfoFetch,
            Self::Program(_) => kind == RequestKind::OpenProgram,
            Self::Status(_) => matches!(
                kind,
                RequestKind::PaymentLocalSign
                    | RequestKind::PaymentServerSign
                    | RequestKind::ShareText
                    | RequestKind::ShareMedia
            ),
        }
    }

    /// Consume the completion with decoded values.
    pub fn deliver(self, reply: Reply) {
        match self {
            Self::Status(f) => f(reply.status),
            Self::Auth(f) => f(reply.status, reply.open_id, reply.access_token),
            Self::UserInfo(f) => f(reply.status, reply.nickname, reply.head_img_url),
            Self::Program(f) => f(reply.status, reply.message),
        }
    }

    /// Consume the completion with a bare status.
    pub fn fail(self, status: StatusCode) {
        self.deliver(Reply::status(status));
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Auth(_) => "auth",
            Self::UserInfo(_) => "user_info",
            Self::Program(_) => "program",
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Completion").field(&self.shape()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_auth_reads_credentials() {
        let (tx, rx) = mpsc::channel();
        let completion = Completion::auth(move |status, open_id, token| {
            tx.send((status, open_id, token)).unwrap();
        });
        completion.deliver(Reply {
            status: StatusCode::Success,
            open_id: Some("u1".into()),
            access_token: Some("t1".into()),
            message: Some("ignored".into()),
            ..Reply::default()
        });
        assert_eq!(
            rx.recv().unwrap(),
            (StatusCode::Success, Some("u1".into()), Some("t1".into()))
        );
    }

    #[test]
    fn test_fail_carries_no_fields() {
        let (tx, rx) = mpsc::channel();
        let completion = Completion::program(move |status, msg| {
            tx.send((status, msg)).unwrap();
        });
        completion.fail(StatusCode::UserCancelled);
        assert_eq!(rx.recv().unwrap(), (StatusCode::UserCancelled, None));
    }

    #[test]
    fn test_shapes_fit_their_kinds() {
        assert!(Completion::status(|_| {}).fits(RequestKind::ShareText));
        assert!(Completion::status(|_| {}).fits(RequestKind::PaymentServerSign));
        assert!(!Completion::status(|_| {}).fits(RequestKind::Auth));
        assert!(Completion::auth(|_, _, _| {}).fits(RequestKind::Auth));
        assert!(!Completion::auth(|_, _, _| {}).fits(RequestKind::UserInfoFetch));
        assert!(Completion::user_info(|_, _, _| {}).fits(RequestKind::UserInfoFetch));
        assert!(Completion::program(|_, _| {}).fits(RequestKind::OpenProgram));
    }
}
