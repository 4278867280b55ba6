//! Blocking client for the Cobbler XML-RPC API.
//!
//! # Design
//! `CobblerClient` holds the endpoint and a `Transport` and nothing else. The
//! session token lives in the `Session` returned by `login` and is passed to
//! every call, so one client can serve several sessions and be shared by
//! reference across threads when its transport is `Sync`.
//!
//! Every operation is one round-trip: build the `MethodCall`, send it, decode
//! the single return value. Nothing is retried.

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::request;
use crate::types::{KickstartFile, NetworkConfig, Session, Snippet, System};
use crate::xmlrpc::{MethodCall, MethodResponse, Value};

/// Synchronous client for one Cobbler server.
#[derive(Debug, Clone)]
pub struct CobblerClient<T = UreqTransport> {
    endpoint: String,
    transport: T,
}

impl CobblerClient<UreqTransport> {
    pub fn new(endpoint: &str) -> Self {
        Self::with_transport(endpoint, UreqTransport::new())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.url)
    }
}

impl<T: Transport> CobblerClient<T> {
    pub fn with_transport(endpoint: &str, transport: T) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_request(&self, call: &MethodCall) -> HttpRequest {
        HttpRequest {
            url: self.endpoint.clone(),
            headers: vec![("content-type".to_string(), "text/xml".to_string())],
            body: call.to_xml(),
        }
    }

    /// Send `call` and return its single result value.
    pub fn call(&self, call: MethodCall) -> Result<Value, ApiError> {
        debug!(method = %call.method_name, endpoint = %self.endpoint, "calling cobbler");
        let response = self
            .transport
            .execute(self.build_request(&call))
            .map_err(ApiError::Transport)?;
        parse_response(&call.method_name, response)
    }

    pub fn login(&self, user: &str, pass: &str) -> Result<Session, ApiError> {
        let token = expect_string(self.call(request::login(user, pass))?)?;
        Ok(Session::new(token))
    }

    pub fn login_with(&self, config: &ClientConfig) -> Result<Session, ApiError> {
        self.login(&config.username, &config.password)
    }

    /// Allocate a new, unsaved system record and return its handle.
    pub fn new_system(&self, session: &Session) -> Result<String, ApiError> {
        expect_string(self.call(request::new_system(session.token()))?)
    }

    pub fn save_system(&self, id: &str, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::save_system(id, session.token()))?)
    }

    pub fn modify_system(&self, id: &str, field: &str, value: Value, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::modify_system(id, field, value, session.token()))?)
    }

    pub fn set_system_name(&self, id: &str, name: &str, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::set_system_name(id, name, session.token()))?)
    }

    pub fn set_system_profile(&self, id: &str, profile: &str, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::set_system_profile(id, profile, session.token()))?)
    }

    pub fn set_system_hostname(&self, id: &str, hostname: &str, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::set_system_hostname(id, hostname, session.token()))?)
    }

    pub fn set_system_nameservers(&self, id: &str, nameservers: &str, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::set_system_nameservers(id, nameservers, session.token()))?)
    }

    pub fn set_system_network(&self, id: &str, config: &NetworkConfig, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::set_system_network(id, config, session.token()))?)
    }

    /// Ask the server to regenerate DHCP, DNS and PXE state.
    pub fn sync(&self, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::sync(session.token()))?)
    }

    pub fn remove_system(&self, name: &str, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::remove_system(name, session.token()))?)
    }

    /// Create and save a complete system record, returning its handle.
    ///
    /// This is several calls. If one fails, the ones before it are not
    /// undone and the record may be left half-configured or unsaved.
    pub fn create_system(&self, system: &System, session: &Session) -> Result<String, ApiError> {
        let id = self.new_system(session)?;
        require("set name", self.set_system_name(&id, &system.name, session)?)?;
        require("set profile", self.set_system_profile(&id, &system.profile, session)?)?;
        require("set hostname", self.set_system_hostname(&id, &system.hostname, session)?)?;
        require(
            "set name servers",
            self.set_system_nameservers(&id, &system.name_servers, session)?,
        )?;
        if let Some(network) = &system.network {
            require("set network", self.set_system_network(&id, network, session)?)?;
        }
        require("save_system", self.save_system(&id, session)?)?;
        Ok(id)
    }

    pub fn create_kickstart_file(&self, file: &KickstartFile, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::write_kickstart_file(&file.name, &file.body, session.token()))?)
    }

    pub fn read_kickstart_file(&self, name: &str, session: &Session) -> Result<String, ApiError> {
        expect_string(self.call(request::read_kickstart_file(name, session.token()))?)
    }

    pub fn delete_kickstart_file(&self, name: &str, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::delete_kickstart_file(name, session.token()))?)
    }

    pub fn create_snippet(&self, snippet: &Snippet, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::write_snippet(&snippet.name, &snippet.body, session.token()))?)
    }

    pub fn read_snippet(&self, name: &str, session: &Session) -> Result<String, ApiError> {
        expect_string(self.call(request::read_snippet(name, session.token()))?)
    }

    pub fn delete_snippet(&self, name: &str, session: &Session) -> Result<bool, ApiError> {
        expect_bool(self.call(request::delete_snippet(name, session.token()))?)
    }
}

/// Check the status, then decode the XML-RPC body into its return value.
fn parse_response(method: &str, response: HttpResponse) -> Result<Value, ApiError> {
    if !(200..300).contains(&response.status) {
        warn!(method, status = response.status, "cobbler returned an HTTP error");
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body,
        });
    }
    match MethodResponse::parse(&response.body)? {
        MethodResponse::Success(value) => Ok(value),
        MethodResponse::Fault { code, message } => {
            warn!(method, code, %message, "cobbler returned a fault");
            Err(ApiError::Fault { code, message })
        }
    }
}

fn expect_bool(value: Value) -> Result<bool, ApiError> {
    value
        .as_bool()
        .ok_or_else(|| ApiError::Deserialization(format!("expected boolean, got {}", value.type_name())))
}

fn expect_string(value: Value) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(ApiError::Deserialization(format!(
            "expected string, got {}",
            other.type_name()
        ))),
    }
}

fn require(operation: &str, accepted: bool) -> Result<(), ApiError> {
    if accepted {
        Ok(())
    } else {
        Err(ApiError::Rejected {
            operation: operation.to_string(),
        })
    }
}
