use anyhow::Result;
use std::path::PathBuf;
use std::sync::Mutex;
use tera::Tera;

pub const MARKER_POPUP: &str = "popup.html";
pub const LOOKUP_POPUP: &str = "lookup_popup.html";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        MARKER_POPUP,
        r#"<div class="poi-popup"><h3>{{ name }}</h3><p>Category: {{ category }}</p><p>Country: {{ country }}</p></div>"#,
    ),
    (
        LOOKUP_POPUP,
        r#"<div class="poi-popup"><h3>{{ query }}</h3><p>{{ formatted_address }}</p></div>"#,
    ),
];

pub struct TemplateEngine {
    tera: Mutex<Tera>,
    base_path: PathBuf,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").field("base_path", &self.base_path).finish_non_exhaustive()
    }
}

impl TemplateEngine {
    /// Loads `*.html` overrides from `base_path`; built-in popups fill the gaps.
    pub fn new(base_path: PathBuf) -> Result<Self> {
        let mut tera = if base_path.exists() {
            let pattern = format!("{}/**/*.html", base_path.to_string_lossy());
            match Tera::new(&pattern) {
                Ok(t) => t,
                Err(e) => {
                    // An empty template directory is fine, the built-ins cover it
                    if e.to_string().contains("no templates found") || e.to_string().contains("match any files") {
                        Tera::default()
                    } else {
                        return Err(e.into());
                    }
                }
            }
        } else {
            Tera::default()
        };

        let loaded: Vec<String> = tera.get_template_names().map(str::to_string).collect();
        for (name, source) in BUILTIN_TEMPLATES {
            if !loaded.iter().any(|l| l == name) {
                tera.add_raw_template(name, source)?;
            }
        }
        tera.autoescape_on(vec![".html"]);

        Ok(Self {
            tera: Mutex::new(tera),
            base_path,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(PathBuf::new())
    }

    pub fn render(&self, template_name: &str, context: &tera::Context) -> Result<String> {
        let tera = self.tera.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tera.render(template_name, context).map_err(|e| {
            let loaded = tera.get_template_names().collect::<Vec<_>>();
            anyhow::anyhow!("Tera Render Error: {}. Requested: '{}'. Loaded: {:?}", e, template_name, loaded)
        })
    }
}
