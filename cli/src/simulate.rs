#![deny(missing_docs)]

//! # Simulate Command
//!
//! Runs one synthetic request through a contract's request pipeline, with a
//! fixed in-memory table of credentials, and prints what a handler would
//! receive or the error a caller would see.

use std::collections::HashMap;
use std::path::Path;

use scaffold_core::{
    error_response, AppError, AppResult, CallerContext, Contract, ErrorBody, Principal,
    PrincipalResolver, RequestParts, RequestView,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::contract_args::ContractArgs;

/// Arguments for the simulate command.
#[derive(clap::Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Contract location.
    #[clap(flatten)]
    pub contract: ContractArgs,

    /// Request method.
    #[clap(long, default_value = "GET")]
    pub method: String,

    /// Matched route pattern, e.g. `/widgets/{id}`.
    #[clap(long)]
    pub route: String,

    /// Path parameter, `NAME=VALUE`.
    #[clap(long = "path", value_parser = parse_pair)]
    pub path_params: Vec<(String, String)>,

    /// Query parameter, `NAME=VALUE`.
    #[clap(long, value_parser = parse_pair)]
    pub query: Vec<(String, String)>,

    /// Header, `NAME=VALUE`.
    #[clap(long, value_parser = parse_pair)]
    pub header: Vec<(String, String)>,

    /// Cookie, `NAME=VALUE`.
    #[clap(long, value_parser = parse_pair)]
    pub cookie: Vec<(String, String)>,

    /// Raw JSON body.
    #[clap(long)]
    pub body: Option<String>,

    /// Known token, `TOKEN=KIND:VALUE`.
    #[clap(long, value_parser = parse_token)]
    pub token: Vec<(String, Principal<String>)>,

    /// Known login, `USER:PASS=KIND:VALUE`.
    #[clap(long, value_parser = parse_login)]
    pub login: Vec<((String, String), Principal<String>)>,
}

/// Resolves principals from fixed tables.
#[derive(Debug, Default)]
pub struct StaticResolver {
    tokens: HashMap<String, Principal<String>>,
    logins: HashMap<(String, String), Principal<String>>,
}

impl PrincipalResolver for StaticResolver {
    type Identity = String;

    fn resolve_login(
        &self,
        _request: &dyn RequestView,
        username: &str,
        password: &str,
    ) -> AppResult<Principal<String>> {
        self.logins
            .get(&(username.to_string(), password.to_string()))
            .cloned()
            .ok_or_else(|| AppError::InvalidCredentials("unknown username or password".into()))
    }

    fn resolve_token(&self, _request: &dyn RequestView, token: &str) -> AppResult<Principal<String>> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::InvalidCredentials("unknown token".into()))
    }
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
enum Outcome {
    Prepared {
        operation: String,
        principal: Option<Principal<String>>,
        params: Map<String, Value>,
        body: Map<String, Value>,
    },
    Rejected {
        status: u16,
        error: ErrorBody,
    },
}

/// Executes the simulate command, printing the outcome as JSON.
pub fn execute(args: &SimulateArgs, config_path: Option<&Path>) -> AppResult<()> {
    let contract = args.contract.load(config_path)?;
    println!("{}", simulate(&contract, args)?);
    Ok(())
}

/// Runs the request described by `args` and renders the outcome.
pub fn simulate(contract: &Contract, args: &SimulateArgs) -> AppResult<String> {
    let request = build_request(args);
    let resolver = StaticResolver {
        tokens: args.token.iter().cloned().collect(),
        logins: args.login.iter().cloned().collect(),
    };

    let mut caller = CallerContext::new();
    let outcome = match contract.prepare(&request, &resolver, &mut caller) {
        Ok(prepared) => Outcome::Prepared {
            operation: prepared.operation.id.clone(),
            principal: caller.take(),
            params: prepared.params,
            body: prepared.body,
        },
        Err(err) => {
            let error = error_response(&err, &request);
            Outcome::Rejected {
                status: error.status,
                error,
            }
        }
    };

    serde_json::to_string_pretty(&outcome)
        .map_err(|e| AppError::Internal(format!("Failed to render outcome: {}", e)))
}

fn build_request(args: &SimulateArgs) -> RequestParts {
    let mut request = RequestParts::new(&args.method, &args.route);
    for (name, value) in &args.path_params {
        request = request.with_path_param(name, value);
    }
    for (name, value) in &args.query {
        request = request.with_query(name, value);
    }
    for (name, value) in &args.header {
        request = request.with_header(name, value);
    }
    for (name, value) in &args.cookie {
        request = request.with_cookie(name, value);
    }
    if let Some(body) = &args.body {
        request = request.with_body(body.as_bytes());
    }
    request
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))
}

fn parse_principal(raw: &str) -> Result<Principal<String>, String> {
    raw.split_once(':')
        .map(|(kind, value)| Principal::new(kind, value.to_string()))
        .ok_or_else(|| format!("expected KIND:VALUE, got '{}'", raw))
}

fn parse_token(raw: &str) -> Result<(String, Principal<String>), String> {
    let (token, principal) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected TOKEN=KIND:VALUE, got '{}'", raw))?;
    Ok((token.to_string(), parse_principal(principal)?))
}

fn parse_login(raw: &str) -> Result<((String, String), Principal<String>), String> {
    let (credentials, principal) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected USER:PASS=KIND:VALUE, got '{}'", raw))?;
    let (user, pass) = credentials
        .split_once(':')
        .ok_or_else(|| format!("expected USER:PASS, got '{}'", credentials))?;
    Ok(((user.to_string(), pass.to_string()), parse_principal(principal)?))
}
