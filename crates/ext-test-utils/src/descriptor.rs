//! Builder for `extension.toml` descriptor content.

/// Descriptor content built field by field.
///
/// # Example
///
/// ```rust
/// use ext_test_utils::Descriptor;
///
/// let toml = Descriptor::new("Menus")
///     .version("1.0")
///     .dependencies(&["users"])
///     .global_routes("menus.routes")
///     .to_toml();
/// assert!(toml.contains("dependencies = [\"users\"]"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    name: Option<String>,
    slug: Option<String>,
    version: Option<String>,
    author: Option<String>,
    description: Option<String>,
    is_core: Option<bool>,
    dependencies: Option<Vec<String>>,
    global_routes: Option<String>,
    listeners: Option<String>,
    bundles: Option<String>,
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Descriptor {
    /// Descriptor with only `info.name` set.
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Descriptor with an empty `[info]` table.
    pub fn bare() -> Self {
        Self::default()
    }

    pub fn slug(mut self, slug: &str) -> Self {
        self.slug = Some(slug.to_string());
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn core(mut self, is_core: bool) -> Self {
        self.is_core = Some(is_core);
        self
    }

    pub fn dependencies(mut self, deps: &[&str]) -> Self {
        self.dependencies = Some(deps.iter().map(|d| d.to_string()).collect());
        self
    }

    /// Reference a registered callback by name.
    pub fn global_routes(mut self, callback: &str) -> Self {
        self.global_routes = Some(quoted(callback));
        self
    }

    /// Raw TOML value for `global_routes`, e.g. `42` or `{ command = "sh" }`.
    pub fn global_routes_raw(mut self, value: &str) -> Self {
        self.global_routes = Some(value.to_string());
        self
    }

    pub fn listeners(mut self, callback: &str) -> Self {
        self.listeners = Some(quoted(callback));
        self
    }

    pub fn listeners_raw(mut self, value: &str) -> Self {
        self.listeners = Some(value.to_string());
        self
    }

    /// Body of the `[bundles]` table, e.g. `handles = "admin/menus"`.
    pub fn bundles(mut self, body: &str) -> Self {
        self.bundles = Some(body.to_string());
        self
    }

    /// Render the descriptor as TOML text.
    pub fn to_toml(&self) -> String {
        let mut out = String::new();

        if let Some(deps) = &self.dependencies {
            let list: Vec<String> = deps.iter().map(|d| quoted(d)).collect();
            out.push_str(&format!("dependencies = [{}]\n", list.join(", ")));
        }
        if let Some(hook) = &self.global_routes {
            out.push_str(&format!("global_routes = {hook}\n"));
        }
        if let Some(hook) = &self.listeners {
            out.push_str(&format!("listeners = {hook}\n"));
        }

        out.push_str("\n[info]\n");
        for (key, value) in [
            ("name", &self.name),
            ("slug", &self.slug),
            ("version", &self.version),
            ("author", &self.author),
            ("description", &self.description),
        ] {
            if let Some(value) = value {
                out.push_str(&format!("{key} = {}\n", quoted(value)));
            }
        }
        if let Some(is_core) = self.is_core {
            out.push_str(&format!("is_core = {is_core}\n"));
        }

        if let Some(body) = &self.bundles {
            out.push_str("\n[bundles]\n");
            out.push_str(body);
            out.push('\n');
        }

        out
    }
}
