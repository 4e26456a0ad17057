//! `page_state_hash`: a hash over title, body class, main innerHTML prefix,
//! and form/input counts, used by `wait_for_stable_dom` to detect when a
//! route transition has finished rendering without re-running a full
//! snapshot on every poll.

use navkit_driver::{Driver, DriverError};

/// Bounded so a huge `innerHTML` doesn't blow up the round trip; only the
/// prefix needs to be representative for stability detection.
const INNER_HTML_PREFIX_LEN: usize = 2048;

const PROBE_JS: &str = r#"
(() => {
  const main = document.querySelector('main') || document.body;
  const html = main ? main.innerHTML.slice(0, __PREFIX_LEN__) : '';
  return {
    title: document.title || '',
    body_class: document.body ? document.body.className : '',
    main_html_prefix: html,
    form_count: document.forms ? document.forms.length : 0,
    input_count: document.querySelectorAll('input,select,textarea').length,
  };
})()
"#;

#[derive(Debug, serde::Deserialize)]
struct PageStateProbe {
    title: String,
    body_class: String,
    main_html_prefix: String,
    form_count: u64,
    input_count: u64,
}

/// Captures the current page state and returns a stable hash over it.
pub async fn page_state_hash(driver: &dyn Driver) -> Result<String, DriverError> {
    let script = PROBE_JS.replace("__PREFIX_LEN__", &INNER_HTML_PREFIX_LEN.to_string());
    let value = driver.evaluate(&script, &[]).await?;
    let probe: PageStateProbe = serde_json::from_value(value)
        .map_err(|err| DriverError::EvalFailed(err.to_string()))?;

    let mut buf = String::new();
    buf.push_str(&probe.title);
    buf.push('\0');
    buf.push_str(&probe.body_class);
    buf.push('\0');
    buf.push_str(&probe.main_html_prefix);
    buf.push('\0');
    buf.push_str(&probe.form_count.to_string());
    buf.push('\0');
    buf.push_str(&probe.input_count.to_string());
    Ok(blake3::hash(buf.as_bytes()).to_hex().to_string())
}
