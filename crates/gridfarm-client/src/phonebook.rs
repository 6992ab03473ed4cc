//! Phonebook: user identity records.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::http::HttpBackend;
use crate::error::{ClientError, ClientResult};
use crate::pager::{Pager, Query, UserFilter};
use crate::pages::Pages;
use crate::types::User;

/// Page size used by the name/email lookup.
const LOOKUP_PAGE_SIZE: u32 = 5;

/// Phonebook API.
pub trait Phonebook: Send + Sync {
    /// Register a user; returns the id assigned by the server.
    fn create(&self, user: &User) -> ClientResult<i64>;

    /// One page of users matching the filter. An empty page is not an error.
    fn list(&self, filter: &UserFilter, pager: Pager) -> ClientResult<Vec<User>>;

    fn get(&self, id: i64) -> ClientResult<User>;

    /// Ask the server whether `signature` is valid for `message` under the
    /// user's key. Both are hex encoded.
    fn validate(&self, id: i64, message: &str, signature: &str) -> ClientResult<bool>;

    /// First user matching either the name or the email.
    fn find_by_name_or_email(&self, name: &str, email: &str) -> ClientResult<User> {
        let filter = UserFilter::default().named(name).with_email(email);
        self.list(&filter, Pager::new(1, LOOKUP_PAGE_SIZE))?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::not_found(format!("user {name} <{email}>")))
    }

    /// Whether a user with that name or email is registered.
    fn exists_by_name_or_email(&self, name: &str, email: &str) -> ClientResult<bool> {
        match self.find_by_name_or_email(name, email) {
            Ok(_) => Ok(true),
            Err(ClientError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// All users matching the filter, fetched `page_size` at a time.
    fn users(&self, filter: UserFilter, page_size: u32) -> Pages<'_, User> {
        Pages::new(page_size, move |pager| self.list(&filter, pager))
    }
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Validity {
    is_valid: bool,
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    signature: &'a str,
    payload: &'a str,
}

/// Phonebook over HTTP.
#[derive(Clone)]
pub struct HttpPhonebook {
    http: HttpBackend,
}

impl HttpPhonebook {
    pub(crate) fn new(http: HttpBackend) -> Self {
        Self { http }
    }
}

impl Phonebook for HttpPhonebook {
    fn create(&self, user: &User) -> ClientResult<i64> {
        let url = self.http.url(&["users"]);
        debug!(url = %url, name = %user.name, "registering user");

        let created: Created = self.http.post(url, user, &[])?;
        Ok(created.id)
    }

    fn list(&self, filter: &UserFilter, pager: Pager) -> ClientResult<Vec<User>> {
        let mut query = Query::new();
        pager.apply(&mut query);
        filter.apply(&mut query);

        self.http
            .get(self.http.url(&["users"]), &query, &[StatusCode::OK])
    }

    fn get(&self, id: i64) -> ClientResult<User> {
        let id = id.to_string();
        self.http
            .get(self.http.url(&["users", &id]), &Query::new(), &[StatusCode::OK])
    }

    fn validate(&self, id: i64, message: &str, signature: &str) -> ClientResult<bool> {
        let id = id.to_string();
        let input = ValidateRequest {
            signature,
            payload: message,
        };

        let output: Validity =
            self.http
                .post(self.http.url(&["users", &id, "validate"]), &input, &[StatusCode::OK])?;
        Ok(output.is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory phonebook serving a fixed user list.
    struct StaticPhonebook {
        users: Vec<User>,
        requests: Mutex<Vec<(UserFilter, Pager)>>,
        fail_with: Option<u16>,
    }

    impl StaticPhonebook {
        fn with_users(users: Vec<User>) -> Self {
            Self {
                users,
                requests: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }
    }

    impl Phonebook for StaticPhonebook {
        fn create(&self, _user: &User) -> ClientResult<i64> {
            unimplemented!("not used")
        }

        fn list(&self, filter: &UserFilter, pager: Pager) -> ClientResult<Vec<User>> {
            self.requests.lock().unwrap().push((filter.clone(), pager));
            if let Some(status) = self.fail_with {
                return Err(ClientError::Api {
                    status,
                    message: "unavailable".into(),
                });
            }
            let matches = |user: &&User| {
                filter.name.as_deref() == Some(user.name.as_str())
                    || filter.email.as_deref() == Some(user.email.as_str())
            };
            Ok(self
                .users
                .iter()
                .filter(matches)
                .skip(((pager.page() - 1) * pager.size()) as usize)
                .take(pager.size() as usize)
                .cloned()
                .collect())
        }

        fn get(&self, id: i64) -> ClientResult<User> {
            self.users
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or(ClientError::Api {
                    status: 404,
                    message: "user not found".into(),
                })
        }

        fn validate(&self, _id: i64, _message: &str, _signature: &str) -> ClientResult<bool> {
            Ok(false)
        }
    }

    fn alice() -> User {
        User {
            id: 42,
            name: "alice.3bot".into(),
            email: "a@b.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn find_uses_first_page_of_five() {
        let phonebook = StaticPhonebook::with_users(vec![alice()]);

        let user = phonebook.find_by_name_or_email("alice.3bot", "").unwrap();
        assert_eq!(user.id, 42);

        let requests = phonebook.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, Pager::new(1, 5));
        assert_eq!(requests[0].0.name.as_deref(), Some("alice.3bot"));
    }

    #[test]
    fn find_on_empty_page_is_not_found() {
        let phonebook = StaticPhonebook::with_users(vec![alice()]);

        let err = phonebook
            .find_by_name_or_email("bob.3bot", "bob@b.com")
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn exists_maps_not_found_to_false_and_propagates_the_rest() {
        let phonebook = StaticPhonebook::with_users(vec![alice()]);
        assert!(phonebook.exists_by_name_or_email("", "a@b.com").unwrap());
        assert!(!phonebook.exists_by_name_or_email("bob.3bot", "").unwrap());

        let failing = StaticPhonebook {
            fail_with: Some(503),
            ..StaticPhonebook::with_users(vec![])
        };
        let err = failing.exists_by_name_or_email("bob.3bot", "").unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn users_iterates_over_test_double() {
        let users: Vec<User> = (1..=7)
            .map(|id| User {
                id,
                name: "dup.3bot".into(),
                ..Default::default()
            })
            .collect();
        let phonebook = StaticPhonebook::with_users(users);

        let ids: Vec<i64> = phonebook
            .users(UserFilter::default().named("dup.3bot"), 3)
            .map(|user| user.unwrap().id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(phonebook.requests.lock().unwrap().len(), 3);
    }

    #[test]
    fn get_missing_user_is_plain_api_error() {
        let phonebook = StaticPhonebook::with_users(vec![]);
        let err = phonebook.get(1).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
    }
}
