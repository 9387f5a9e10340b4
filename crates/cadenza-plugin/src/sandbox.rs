// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WASM plugin sandbox using wasmtime.
//!
//! One [`Engine`] compiles every plugin. Each call gets a fresh [`Store`]
//! with its own fuel budget, memory cap and epoch deadline, so plugins share
//! no state between calls and cannot starve the host.
//!
//! Plugins see exactly one import module, `cadenza`:
//!
//! | import | signature |
//! |---|---|
//! | `log` | `(level, ptr, len)` |
//! | `get_input_len` | `() -> len` |
//! | `get_input` | `(ptr)` |
//! | `set_output` | `(ptr, len)` |
//! | `http_get` | `(url_ptr, url_len) -> status` |
//! | `get_response_len` | `() -> len` |
//! | `get_response` | `(ptr)` |
//!
//! No filesystem, environment or process bindings exist.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use cadenza_config::SandboxConfig;
use cadenza_core::CadenzaError;
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use wasmtime::{
    Caller, Config, Engine, Extern, Linker, Memory, Module, Store, StoreLimits,
    StoreLimitsBuilder, Trap,
};

/// Import module name plugins link against.
pub const HOST_MODULE: &str = "cadenza";

/// Why a sandboxed call did not complete.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("module does not export `{0}`")]
    MissingExport(String),

    #[error("exceeded fuel limit ({0} units)")]
    FuelExhausted(u64),

    #[error("exceeded wall-clock timeout ({0}s)")]
    Timeout(u64),

    #[error("trapped: {0}")]
    Trap(String),

    #[error("sandbox task failed: {0}")]
    Join(String),
}

/// Per-call store data.
struct HostState {
    plugin: String,
    input: String,
    output: Option<String>,
    response: Vec<u8>,
    limits: StoreLimits,
    http: reqwest::Client,
    allow_private_hosts: bool,
}

/// Advances the engine epoch once per second until dropped.
///
/// A single ticker serves every concurrent call, so store deadlines measure
/// wall-clock seconds regardless of how many plugins are running.
struct EpochTicker {
    stop: Arc<AtomicBool>,
}

impl EpochTicker {
    fn start(engine: Engine) -> Result<Self, CadenzaError> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        thread::Builder::new()
            .name("cadenza-epoch".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_secs(1));
                    engine.increment_epoch();
                }
            })
            .map_err(|e| CadenzaError::Internal(format!("failed to start epoch ticker: {e}")))?;
        Ok(Self { stop })
    }
}

impl Drop for EpochTicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Shared compile-and-call runtime for plugin modules.
pub struct Sandbox {
    engine: Engine,
    linker: Arc<Linker<HostState>>,
    http: reqwest::Client,
    limits: SandboxConfig,
    _ticker: EpochTicker,
}

impl Sandbox {
    pub fn new(limits: &SandboxConfig) -> Result<Self, CadenzaError> {
        let mut config = Config::new();
        config.consume_fuel(true);
        config.epoch_interruption(true);

        let engine = Engine::new(&config).map_err(|e| {
            CadenzaError::Internal(format!("failed to create wasmtime engine: {e}"))
        })?;

        let mut linker = Linker::new(&engine);
        define_host_functions(&mut linker)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(limits.epoch_timeout_secs))
            .build()
            .map_err(|e| CadenzaError::Internal(format!("failed to build HTTP client: {e}")))?;

        let ticker = EpochTicker::start(engine.clone())?;

        info!(
            fuel = limits.fuel,
            memory_mb = limits.memory_mb,
            timeout_secs = limits.epoch_timeout_secs,
            "WASM plugin sandbox initialized"
        );

        Ok(Self {
            engine,
            linker: Arc::new(linker),
            http,
            limits: limits.clone(),
            _ticker: ticker,
        })
    }

    /// Compiles binary or text-format source.
    pub fn compile(&self, source: &[u8]) -> Result<Module, CadenzaError> {
        Module::new(&self.engine, source).map_err(|e| CadenzaError::CannotParse {
            message: format!("failed to compile module: {e}"),
        })
    }

    /// Instantiates `module` in a fresh store and calls the `() -> ()`
    /// export `export` with `input` readable through `get_input`.
    ///
    /// Returns whatever the plugin passed to `set_output`, if anything.
    pub async fn call(
        &self,
        plugin: &str,
        module: &Module,
        export: &str,
        input: String,
    ) -> Result<Option<String>, SandboxError> {
        if module.get_export(export).is_none() {
            return Err(SandboxError::MissingExport(export.to_string()));
        }

        let memory_bytes = self.limits.memory_mb as usize * 1024 * 1024;
        let state = HostState {
            plugin: plugin.to_string(),
            input,
            output: None,
            response: Vec::new(),
            limits: StoreLimitsBuilder::new().memory_size(memory_bytes).build(),
            http: self.http.clone(),
            allow_private_hosts: self.limits.allow_private_hosts,
        };
        let mut store = Store::new(&self.engine, state);
        store.limiter(|s| &mut s.limits);
        store
            .set_fuel(self.limits.fuel)
            .map_err(|e| SandboxError::Trap(format!("failed to set fuel: {e}")))?;
        store.epoch_deadline_trap();
        store.set_epoch_deadline(self.limits.epoch_timeout_secs);

        let linker = self.linker.clone();
        let module = module.clone();
        let export = export.to_string();

        // Blocking thread: plugin code runs synchronously and `http_get`
        // needs a runtime handle it can block on.
        let result = tokio::task::spawn_blocking(move || -> wasmtime::Result<Option<String>> {
            let instance = linker.instantiate(&mut store, &module)?;
            let func = instance.get_typed_func::<(), ()>(&mut store, &export)?;
            func.call(&mut store, ())?;
            Ok(store.into_data().output)
        })
        .await
        .map_err(|e| SandboxError::Join(e.to_string()))?;

        result.map_err(|e| {
            let err = self.classify(e);
            trace!(plugin, error = %err, "sandboxed call failed");
            err
        })
    }

    fn classify(&self, err: wasmtime::Error) -> SandboxError {
        match err.downcast_ref::<Trap>() {
            Some(Trap::OutOfFuel) => SandboxError::FuelExhausted(self.limits.fuel),
            Some(Trap::Interrupt) => SandboxError::Timeout(self.limits.epoch_timeout_secs),
            _ => SandboxError::Trap(format!("{err:#}")),
        }
    }
}

fn define_host_functions(linker: &mut Linker<HostState>) -> Result<(), CadenzaError> {
    linker
        .func_wrap(
            HOST_MODULE,
            "log",
            |mut caller: Caller<'_, HostState>, level: i32, ptr: i32, len: i32| {
                let Some(memory) = exported_memory(&mut caller) else {
                    return;
                };
                let Some(msg) = read_string(&memory, &caller, ptr, len) else {
                    return;
                };
                let plugin = caller.data().plugin.as_str();
                match level {
                    0 => trace!(plugin, "{msg}"),
                    1 => debug!(plugin, "{msg}"),
                    2 => info!(plugin, "{msg}"),
                    3 => warn!(plugin, "{msg}"),
                    _ => tracing::error!(plugin, "{msg}"),
                }
            },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "get_input_len",
            |caller: Caller<'_, HostState>| -> i32 { caller.data().input.len() as i32 },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "get_input",
            |mut caller: Caller<'_, HostState>, ptr: i32| -> Result<(), wasmtime::Error> {
                let memory = exported_memory(&mut caller)
                    .ok_or_else(|| anyhow!("module has no exported memory"))?;
                let input = std::mem::take(&mut caller.data_mut().input);
                let written = write_bytes(&memory, &mut caller, ptr, input.as_bytes());
                caller.data_mut().input = input;
                if written {
                    Ok(())
                } else {
                    Err(anyhow!("get_input buffer out of bounds").into())
                }
            },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "set_output",
            |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> Result<(), wasmtime::Error> {
                let memory = exported_memory(&mut caller)
                    .ok_or_else(|| anyhow!("module has no exported memory"))?;
                let output = read_string(&memory, &caller, ptr, len)
                    .ok_or_else(|| anyhow!("set_output range is out of bounds or not UTF-8"))?;
                caller.data_mut().output = Some(output);
                Ok(())
            },
        )
        .map_err(linker_err)?;

    // Response body is kept in the store until the next http_get.
    linker
        .func_wrap(
            HOST_MODULE,
            "http_get",
            |mut caller: Caller<'_, HostState>,
             url_ptr: i32,
             url_len: i32|
             -> Result<i32, wasmtime::Error> {
                let memory = exported_memory(&mut caller)
                    .ok_or_else(|| anyhow!("module has no exported memory"))?;
                let url = read_string(&memory, &caller, url_ptr, url_len)
                    .ok_or_else(|| anyhow!("failed to read URL from plugin memory"))?;

                let parsed =
                    reqwest::Url::parse(&url).map_err(|e| anyhow!("invalid URL '{url}': {e}"))?;
                check_destination(&parsed, caller.data().allow_private_hosts)?;

                let client = caller.data().http.clone();
                let handle = tokio::runtime::Handle::current();
                let fetched = handle.block_on(async move {
                    let resp = client.get(parsed).send().await?;
                    let status = resp.status().as_u16();
                    let body = resp.bytes().await?;
                    Ok::<_, reqwest::Error>((status, body))
                });

                match fetched {
                    Ok((status, body)) => {
                        debug!(plugin = %caller.data().plugin, url = %url, status, "plugin http_get completed");
                        caller.data_mut().response = body.to_vec();
                        Ok(i32::from(status))
                    }
                    Err(e) => {
                        warn!(plugin = %caller.data().plugin, url = %url, error = %e, "plugin http_get failed");
                        Err(anyhow!("HTTP request failed: {e}").into())
                    }
                }
            },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "get_response_len",
            |caller: Caller<'_, HostState>| -> i32 { caller.data().response.len() as i32 },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "get_response",
            |mut caller: Caller<'_, HostState>, ptr: i32| -> Result<(), wasmtime::Error> {
                let memory = exported_memory(&mut caller)
                    .ok_or_else(|| anyhow!("module has no exported memory"))?;
                let response = std::mem::take(&mut caller.data_mut().response);
                let written = write_bytes(&memory, &mut caller, ptr, &response);
                caller.data_mut().response = response;
                if written {
                    Ok(())
                } else {
                    Err(anyhow!("get_response buffer out of bounds").into())
                }
            },
        )
        .map_err(linker_err)?;

    Ok(())
}

/// Only http(s) is reachable, and literal private addresses only when allowed.
fn check_destination(url: &reqwest::Url, allow_private: bool) -> Result<(), wasmtime::Error> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(anyhow!("scheme '{other}' is not permitted").into()),
    }
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("URL has no host: {url}"))?;
    if allow_private {
        return Ok(());
    }
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") {
        return Err(anyhow!("destination '{host}' is not permitted").into());
    }
    if let Ok(ip) = host.parse::<IpAddr>()
        && is_private(ip)
    {
        return Err(anyhow!("destination '{ip}' is not permitted").into());
    }
    Ok(())
}

fn is_private(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
                || v6.to_ipv4_mapped().is_some_and(|v4| is_private(IpAddr::V4(v4)))
        }
    }
}

fn exported_memory(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
    match caller.get_export("memory") {
        Some(Extern::Memory(mem)) => Some(mem),
        _ => None,
    }
}

fn read_string(memory: &Memory, caller: &Caller<'_, HostState>, ptr: i32, len: i32) -> Option<String> {
    let start = ptr as u32 as usize;
    let end = start.checked_add(len as u32 as usize)?;
    let data = memory.data(caller);
    let bytes = data.get(start..end)?;
    String::from_utf8(bytes.to_vec()).ok()
}

fn write_bytes(memory: &Memory, caller: &mut Caller<'_, HostState>, ptr: i32, bytes: &[u8]) -> bool {
    let start = ptr as u32 as usize;
    let Some(end) = start.checked_add(bytes.len()) else {
        return false;
    };
    match memory.data_mut(caller).get_mut(start..end) {
        Some(dst) => {
            dst.copy_from_slice(bytes);
            true
        }
        None => false,
    }
}

fn linker_err(e: wasmtime::Error) -> CadenzaError {
    CadenzaError::Internal(format!("failed to define host function: {e}"))
}
