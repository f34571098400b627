//! Chrome DevTools Protocol oracle implementation

use crate::{BoundingBox, Clip, Error, GraphicCandidate, HarvestConfig, Placement, RenderOracle, Result, Viewport};
use base64::Engine as Base64Engine;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page, DOM};
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Headless Chrome session (uses the `headless_chrome` crate)
///
/// Launches one browser with a single tab. Every pipeline stage drives that
/// tab in turn; dropping or closing the oracle terminates the browser.
pub struct CdpOracle {
    browser: Browser,
    tab: Arc<Tab>,
}

impl CdpOracle {
    /// Launch headless Chrome sized to the listing viewport.
    pub fn launch(config: &HarvestConfig) -> Result<Self> {
        let viewport = config.listing_viewport;
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((viewport.width, viewport.height)))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;

        // bounds navigation and the element waits that do not pass their own timeout
        tab.set_default_timeout(config.navigation_timeout());

        Ok(Self { browser, tab })
    }

    /// Evaluate `script` and decode the JSON string it returns.
    ///
    /// Scripts return `JSON.stringify(...)` so results arrive by value
    /// regardless of how the protocol serializes objects.
    fn eval_json<T: serde::de::DeserializeOwned>(&self, script: &str, await_promise: bool) -> Result<T> {
        let result = self
            .tab
            .evaluate(script, await_promise)
            .map_err(|e| Error::ScriptError(format!("Evaluation failed: {}", e)))?;

        let value = result
            .value
            .ok_or_else(|| Error::ScriptError("No value returned from evaluation".into()))?;

        let text = value
            .as_str()
            .ok_or_else(|| Error::ScriptError(format!("Expected a JSON string, got {}", value)))?;

        serde_json::from_str(text).map_err(|e| Error::ScriptError(format!("Malformed script result: {}", e)))
    }

    fn set_background_transparent(&self, transparent: bool) -> Result<()> {
        let color = transparent.then_some(DOM::RGBA {
            r: 0,
            g: 0,
            b: 0,
            a: Some(0.0),
        });
        self.tab
            .call_method(Emulation::SetDefaultBackgroundColorOverride { color })
            .map_err(|e| Error::RenderError(format!("Failed to override background: {}", e)))?;
        Ok(())
    }
}

/// Clip scale that makes one CSS pixel one captured pixel.
///
/// Captures are sized `clip * scale * devicePixelRatio`; unusable ratios fall
/// back to 1.
fn capture_scale(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        1.0 / device_pixel_ratio
    } else {
        1.0
    }
}

/// Quote `s` as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl RenderOracle for CdpOracle {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation to {} failed: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation to {} failed: {}", url, e)))?;

        Ok(())
    }

    fn page_html(&mut self) -> Result<String> {
        self.eval_json("JSON.stringify(document.documentElement ? document.documentElement.outerHTML : '')", false)
    }

    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map_err(|e| {
                debug!("Waiting for '{}' failed: {}", selector, e);
                Error::Timeout(timeout.as_millis() as u64)
            })?;
        Ok(())
    }

    fn query_graphics(&mut self, selector: &str) -> Result<Vec<GraphicCandidate>> {
        let script = format!(
            r#"JSON.stringify(Array.from(document.querySelectorAll({sel})).map(function(el) {{
                const r = el.getBoundingClientRect();
                return {{ width: r.width, height: r.height, markup: el.outerHTML }};
            }}))"#,
            sel = js_string(selector)
        );
        self.eval_json(&script, false)
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.tab
            .set_bounds(Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(f64::from(viewport.width)),
                height: Some(f64::from(viewport.height)),
            })
            .map_err(|e| Error::RenderError(format!("Failed to resize viewport: {}", e)))?;
        Ok(())
    }

    fn set_content(&mut self, html: &str) -> Result<()> {
        let b64 = Base64Engine::encode(&base64::engine::general_purpose::STANDARD, html);
        self.navigate(&format!("data:text/html;charset=utf-8;base64,{}", b64))
    }

    fn wait_for_layout(&mut self) -> Result<()> {
        // fonts first, then two frames so style, layout and paint have all run
        let script = r#"(async function() {
            if (document.fonts && document.fonts.ready) { await document.fonts.ready; }
            await new Promise(function(resolve) {
                requestAnimationFrame(function() { requestAnimationFrame(resolve); });
            });
            return JSON.stringify(true);
        })()"#;
        let _: bool = self.eval_json(script, true)?;
        Ok(())
    }

    fn measure(&mut self, selector: &str) -> Result<BoundingBox> {
        let script = format!(
            r#"JSON.stringify((function() {{
                const el = document.querySelector({sel});
                if (!el) return null;
                const r = el.getBoundingClientRect();
                return {{ x: r.x, y: r.y, width: r.width, height: r.height }};
            }})())"#,
            sel = js_string(selector)
        );
        let bbox: Option<BoundingBox> = self.eval_json(&script, false)?;
        bbox.ok_or_else(|| Error::RenderError(format!("No element matches '{}'", selector)))
    }

    fn apply_placement(&mut self, selector: &str, placement: &Placement) -> Result<()> {
        let script = format!(
            r#"JSON.stringify((function() {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.style.transformOrigin = "0 0";
                el.style.transform = "scale({scale})";
                el.style.left = "{x}px";
                el.style.top = "{y}px";
                return true;
            }})())"#,
            sel = js_string(selector),
            scale = placement.scale,
            x = placement.offset_x,
            y = placement.offset_y
        );
        let applied: bool = self.eval_json(&script, false)?;
        if !applied {
            return Err(Error::RenderError(format!("No element matches '{}'", selector)));
        }
        Ok(())
    }

    fn screenshot(&mut self, clip: Clip, transparent: bool) -> Result<Vec<u8>> {
        let ratio: f64 = self.eval_json("JSON.stringify(window.devicePixelRatio || 1)", false)?;
        let scale = capture_scale(ratio);
        if scale != 1.0 {
            debug!("Device pixel ratio {}, capturing at scale {}", ratio, scale);
        }
        self.set_background_transparent(transparent)?;

        let captured = self
            .tab
            .capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                Some(Page::Viewport {
                    x: clip.x,
                    y: clip.y,
                    width: clip.width,
                    height: clip.height,
                    scale,
                }),
                true,
            )
            .map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)));

        if transparent {
            // restore the default white page background for later navigations
            if let Err(e) = self.set_background_transparent(false) {
                warn!("{}", e);
            }
        }

        captured
    }

    fn close(self) -> Result<()> {
        // Drop explicitly so the child process is terminated promptly.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
