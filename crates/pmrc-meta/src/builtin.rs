//! The standard package-manager key definitions
//!
//! Defaults that depend on the machine (home directory, cache location,
//! editor, color) are computed from [`RuntimeFacts`] once, when the catalog
//! is built.

use serde_json::{Value, json};

use crate::definition::{DefinitionSpec, EnvValue, ShortValue};
use crate::facts::RuntimeFacts;
use crate::location::Location;
use crate::types::ValueType;

const USER_AGENT: &str =
    "npm/{npm-version} node/{node-version} {platform} {arch} workspaces/{workspaces} {ci}";

fn spec(default: impl Into<Value>, types: impl IntoIterator<Item = ValueType>) -> DefinitionSpec {
    DefinitionSpec::new().default_value(default).types(types)
}

fn flag(default: bool) -> DefinitionSpec {
    spec(default, [ValueType::Boolean])
}

fn string(default: impl Into<Value>) -> DefinitionSpec {
    spec(default, [ValueType::String])
}

fn value(v: &str) -> ShortValue {
    ShortValue::Value(v.to_string())
}

fn internal(default: impl Into<Value>, types: impl IntoIterator<Item = ValueType>) -> DefinitionSpec {
    spec(default, types)
        .location(&[Location::Internal])
        .env_export(false)
}

fn color_env(value: &Value) -> Option<String> {
    let flag = if value.as_bool() == Some(false) { "0" } else { "1" };
    Some(flag.to_string())
}

fn cache_default(facts: &RuntimeFacts) -> String {
    if facts.is_windows() {
        if let Some(local) = facts.env_var("LOCALAPPDATA") {
            return format!("{local}\\npm-cache");
        }
    }
    match &facts.home {
        Some(home) => home.join(".npm").to_string_lossy().into_owned(),
        None => facts.cwd.join(".npm").to_string_lossy().into_owned(),
    }
}

fn editor_default(facts: &RuntimeFacts) -> String {
    let fallback = if facts.is_windows() { "notepad.exe" } else { "vi" };
    facts
        .env_var("EDITOR")
        .or_else(|| facts.env_var("VISUAL"))
        .unwrap_or(fallback)
        .to_string()
}

fn userconfig_default(facts: &RuntimeFacts) -> String {
    match &facts.home {
        Some(home) => home.join(".npmrc").to_string_lossy().into_owned(),
        None => "~/.npmrc".to_string(),
    }
}

/// Every standard definition, in documentation order.
pub fn definitions(facts: &RuntimeFacts) -> Vec<(&'static str, DefinitionSpec)> {
    let no_color = facts.env_var("NO_COLOR").is_some_and(|v| v != "0");
    let ci = facts.env_var("CI").is_some_and(|v| v != "false");

    vec![
        // auth
        ("_auth", spec(Value::Null, [ValueType::String])
            .description("A basic-auth string to use when authenticating against the npm registry. This will ONLY be used to authenticate against the npm registry. For other registries you will need to scope it like \"//other-registry.tld/:_auth\".")),
        ("_authToken", spec(Value::Null, [ValueType::String])
            .description("A bearer token for the registry. Must be scoped to a registry, e.g. `//registry.npmjs.org/:_authToken`.")),
        ("_password", spec(Value::Null, [ValueType::String])
            .description("The password paired with `username`. Must be scoped to a registry.")),
        ("username", spec(Value::Null, [ValueType::String])
            .description("The username used for basic auth. Must be scoped to a registry.")),
        ("email", spec(Value::Null, [ValueType::String])
            .description("The email of the logged-in user.\n\nSet by the `npm adduser` command. Should not be set explicitly.")),
        ("certfile", spec(Value::Null, [ValueType::Path])
            .description("A path to a file containing the client certificate. Must be scoped to a registry.")),
        ("keyfile", spec(Value::Null, [ValueType::Path])
            .description("A path to a file containing the client key. Must be scoped to a registry.")),
        ("otp", spec(Value::Null, [ValueType::String])
            .description("This is a one-time password from a two-factor authenticator.")),
        ("auth-type", spec("web", [ValueType::choice(["legacy", "web"])])
            .description("What authentication strategy to use with `login`. Note that if an `otp` config is given, this value will always be set to `legacy`.")),
        ("registry", spec("https://registry.npmjs.org/", [ValueType::Url])
            .description("The base URL of the npm registry.")),
        ("scope", string("")
            .default_description("the scope of the current project, if any, or \"\"")
            .hint("@scope")
            .description("Associate an operation with a scope for a scoped registry.")),

        // location and prefix
        ("global", flag(false)
            .short("g", ShortValue::Same)
            .alias("local", ShortValue::Negate)
            .description("Operates in \"global\" mode, so that packages are installed into the `prefix` folder instead of the current working directory.")),
        ("location", spec("user", [ValueType::choice(["global", "user", "project"])])
            .short("L", ShortValue::Same)
            .default_description("\"user\" unless `--global` is passed, which will also set this value to \"global\"")
            .description("When passed to `config` this refers to which config file to use.")),
        ("prefix", spec(Value::Null, [ValueType::Path])
            .short("C", ShortValue::Same)
            .default_description("In global mode, the folder where the node executable is installed. Otherwise, the nearest parent folder containing either a package.json file or a node_modules folder.")
            .description("The location to install global items. If set on the command line, then it forces non-global commands to run in the specified folder.")),
        ("globalconfig", spec(Value::Null, [ValueType::Path])
            .default_description("The global --prefix setting plus 'etc/npmrc'. For example, '/usr/local/etc/npmrc'")
            .description("The config file to read for global config options.")),
        ("userconfig", spec(userconfig_default(facts), [ValueType::Path])
            .default_description("\"~/.npmrc\"")
            .description("The location of user-level configuration settings.")),
        ("workspaces", spec(Value::Null, [ValueType::Boolean])
            .alias("ws", ShortValue::Same)
            .description("Set to true to run the command in the context of all configured workspaces.")),
        ("workspace", spec(json!([]), [ValueType::String, ValueType::Path, ValueType::Array])
            .short("w", ShortValue::Same)
            .hint("workspace-name")
            .hint("workspace-path")
            .description("Enable running a command in the context of the configured workspaces of the current project.")),
        ("include-workspace-root", flag(false)
            .alias("iwr", ShortValue::Same)
            .description("Include the workspace root when workspaces are enabled for a command.")),

        // dependency selection
        ("omit", spec(json!([]), [ValueType::Array, ValueType::choice(["dev", "optional", "peer"])])
            .default_description("'dev' if the `NODE_ENV` environment variable is set to 'production', otherwise empty.")
            .description("Dependency types to omit from the installation tree on disk.")),
        ("include", spec(json!([]), [ValueType::Array, ValueType::choice(["prod", "dev", "optional", "peer"])])
            .description("Option that allows for defining which types of dependencies to install.")),
        ("dev", flag(false)
            .deprecated("Please use --include=dev instead.")
            .description("Alias for `--include=dev`.")),
        ("production", spec(Value::Null, [ValueType::Boolean])
            .deprecated("Use `--omit=dev` instead.")
            .description("Alias for `--omit=dev`")),
        ("optional", spec(Value::Null, [ValueType::Boolean])
            .default_description("null")
            .deprecated("Use `--omit=optional` to exclude optional dependencies, or `--include=optional` to include them.\n\n    Default value does install optional deps unless otherwise omitted.")
            .description("Alias for --include=optional or --omit=optional")),
        ("only", spec(Value::Null, [ValueType::choice(["prod", "production"])])
            .deprecated("Use `--omit=dev` to omit dev dependencies from the install.")
            .description("When set to `prod` or `production`, this is an alias for `--omit=dev`.")),
        ("also", spec(Value::Null, [ValueType::choice(["dev", "development"])])
            .deprecated("Please use --include=dev instead.")
            .description("When set to `dev` or `development`, this is an alias for `--include=dev`.")),

        // cache
        ("cache", spec(cache_default(facts), [ValueType::Path])
            .default_description("Windows: `%LocalAppData%\\npm-cache`, Posix: `~/.npm`")
            .description("The location of npm's cache directory.")),
        ("logs-dir", spec(Value::Null, [ValueType::Path])
            .default_description("A directory named `_logs` inside the cache")
            .description("The location of npm's log directory.")),
        ("cache-max", spec(i64::MAX, [ValueType::Number])
            .default_description("Infinity")
            .deprecated("This option has been deprecated in favor of `--prefer-online`")
            .description("`--cache-max=0` is an alias for `--prefer-online`")),
        ("cache-min", spec(0, [ValueType::Number])
            .deprecated("This option has been deprecated in favor of `--prefer-offline`.")
            .description("`--cache-min=9999 (or bigger)` is an alias for `--prefer-offline`.")),
        ("prefer-online", flag(false)
            .description("If true, staleness checks for cached data will be forced, making the CLI look for updates immediately even for fresh package data.")),
        ("prefer-offline", flag(false)
            .description("If true, staleness checks for cached data will be bypassed, but missing data will be requested from the server.")),

        // tls
        ("cafile", spec(Value::Null, [ValueType::Path])
            .description("A path to a file containing one or multiple Certificate Authority signing certificates.")),
        ("ca", spec(Value::Null, [ValueType::String, ValueType::Array])
            .description("The Certificate Authority signing certificate that is trusted for SSL connections to the registry.")),
        ("strict-ssl", flag(true)
            .description("Whether or not to do SSL key validation when making requests to the registry via https.")),
        ("proxy", spec(Value::Null, [ValueType::choice(["false"]), ValueType::Url])
            .description("A proxy to use for outgoing http requests.")),
        ("https-proxy", spec(Value::Null, [ValueType::Url])
            .description("A proxy to use for outgoing https requests.")),
        ("noproxy", spec("", [ValueType::String, ValueType::Array])
            .default_description("The value of the NO_PROXY environment variable")
            .description("Domain extensions that should bypass any proxies.")),

        // output
        ("color", spec(!no_color, [ValueType::choice(["always"]), ValueType::Boolean])
            .default_description("true unless the NO_COLOR environ is set to something other than '0'")
            .set_env("COLOR", EnvValue::Map(color_env))
            .description("If false, never shows colors. If `\"always\"` then always shows colors. If true, then only prints color codes for tty file descriptors.")),
        ("loglevel", spec("notice", [ValueType::choice(["silent", "error", "warn", "notice", "http", "info", "verbose", "silly"])])
            .short("s", value("silent"))
            .short("d", value("info"))
            .short("dd", value("verbose"))
            .short("ddd", value("silly"))
            .short("q", value("warn"))
            .alias("silent", value("silent"))
            .alias("quiet", value("warn"))
            .alias("verbose", value("verbose"))
            .description("What level of logs to report.")),
        ("progress", flag(!ci)
            .default_description("`true` unless running in a known CI system")
            .description("When set to `true`, npm will display a progress bar during time intensive operations, if `process.stderr` is a TTY.")),
        ("json", flag(false)
            .description("Whether or not to output JSON data, rather than the normal output.")),
        ("parseable", flag(false)
            .short("p", ShortValue::Same)
            .description("Output parseable results from commands that write to standard output.")),
        ("long", flag(false)
            .short("l", ShortValue::Same)
            .description("Show extended information in `ls`, `search`, and `help-search`.")),
        ("usage", flag(false)
            .short("h", ShortValue::Same)
            .alias("?", ShortValue::Same)
            .alias("H", ShortValue::Same)
            .description("Show short usage output about the command specified.")),
        ("version", flag(false)
            .short("v", ShortValue::Same)
            .description("If true, output the npm version and exit successfully.")),
        ("title", string("npm")
            .set_process("title", EnvValue::Identity)
            .description("The title that will be shown in the process list.")),

        // search
        ("searchlimit", spec(20, [ValueType::Number])
            .description("Number of items to limit search results to.")),
        ("description", flag(true)
            .description("Show the description in `npm search`")),
        ("searchexclude", string("")
            .description("Space-separated options that limit the results from search.")),
        ("searchopts", string("")
            .description("Space-separated options that are always passed to search.")),

        // saving
        ("save-bundle", flag(false)
            .short("B", ShortValue::Same)
            .description("If a package would be saved at install time by the use of `--save`, `--save-dev`, or `--save-optional`, then also put it in the `bundleDependencies` list.")),
        ("save-peer", flag(false)
            .description("Save installed packages to a package.json file as `peerDependencies`")),
        ("save-dev", flag(false)
            .short("D", ShortValue::Same)
            .description("Save installed packages to a package.json file as `devDependencies`.")),
        ("save-optional", flag(false)
            .short("O", ShortValue::Same)
            .description("Save installed packages to a package.json file as `optionalDependencies`.")),
        ("save-prod", flag(false)
            .short("P", ShortValue::Same)
            .description("Save installed packages into `dependencies` specifically.")),
        ("save-exact", flag(false)
            .short("E", ShortValue::Same)
            .description("Dependencies saved to package.json will be configured with an exact version rather than using npm's default semver range operator.")),
        ("save-prefix", string("^")
            .description("Configure how versions of packages installed to a package.json file via `--save` or `--save-dev` get prefixed.")),
        ("global-style", flag(false)
            .deprecated("This option has been deprecated in favor of `--install-strategy=shallow`")
            .description("Only install direct dependencies in the top level `node_modules`, but hoist on deeper dependencies.")),
        ("legacy-bundling", flag(false)
            .deprecated("This option has been deprecated in favor of `--install-strategy=nested`")
            .description("Instead of hoisting package installs in `node_modules`, install packages in the same manner that they are depended on.")),
        ("install-strategy", spec("hoisted", [ValueType::choice(["hoisted", "nested", "shallow", "linked"])])
            .description("Sets the strategy for installing packages in node_modules.")),
        ("package-lock", flag(true)
            .description("If set to false, then ignore `package-lock.json` files when installing.")),
        ("package-lock-only", flag(false)
            .description("If set to true, the current operation will only use the `package-lock.json`, ignoring `node_modules`.")),

        // misc
        ("before", spec(Value::Null, [ValueType::Date])
            .alias("enjoy-by", ShortValue::Same)
            .description("If passed to `npm install`, will rebuild the npm tree such that only versions that were available **on or before** the given date are installed.")),
        ("force", flag(false)
            .short("f", ShortValue::Same)
            .description("Removes various protections against unfortunate side effects, common mistakes, unnecessary performance degradation, and malicious input.")),
        ("yes", spec(Value::Null, [ValueType::Boolean])
            .short("y", ShortValue::Same)
            .description("Automatically answer \"yes\" to any prompts that npm might print on the command line.")),
        ("dry-run", flag(false)
            .description("Indicates that you don't want npm to make any changes and that it should only report what it would have done.")),
        ("editor", spec(editor_default(facts), [ValueType::String])
            .default_description("The EDITOR or VISUAL environment variables, or '%SYSTEMROOT%\\notepad.exe' on Windows, or 'vi' on Unix systems")
            .set_env("EDITOR", EnvValue::Identity)
            .description("The command to run for `npm edit` and `npm config edit`.")),
        ("node-options", spec(Value::Null, [ValueType::String])
            .set_env("NODE_OPTIONS", EnvValue::Identity)
            .description("Options to pass through to Node.js via the `NODE_OPTIONS` environment variable.")),
        ("user-agent", string(USER_AGENT)
            .description("Sets the User-Agent request header. The following fields are replaced with their actual counterpart: `{npm-version}`, `{node-version}`, `{platform}`, `{arch}`, `{workspaces}`, `{ci}`.")),
        ("ci-name", spec(facts.env_var("CI_NAME").map(str::to_string), [ValueType::String])
            .default_description("The name of the current CI system, or `null` when not on a known CI platform.")
            .description("The name of a continuous integration system. If not set explicitly, npm will detect the current CI environment.")),
        ("init-author-name", string("")
            .description("The value `npm init` should use by default for the package author's name.")),
        ("init.author.name", string("")
            .deprecated("Use `--init-author-name` instead.")
            .description("Alias for `--init-author-name`")),

        // internal facts
        ("cwd", internal(Value::Null, [ValueType::String]).description("The working directory.")),
        ("default-global-prefix", internal(Value::Null, [ValueType::String]).description("The prefix the tool was installed into.")),
        ("local-prefix-root", internal(Value::Null, [ValueType::String]).description("The nearest package root above the working directory.")),
        ("local-prefix-workspace", internal(Value::Null, [ValueType::String]).description("The workspace root above the package root.")),
        ("node-version", internal(Value::Null, [ValueType::String]).description("The running node version.")),
        ("npm-version", internal(Value::Null, [ValueType::String]).description("The running npm version.")),
        ("platform", internal(Value::Null, [ValueType::String]).description("The operating system name.")),
        ("arch", internal(Value::Null, [ValueType::String]).description("The CPU architecture.")),
        ("stdout-tty", internal(false, [ValueType::Boolean]).description("Whether stdout is a terminal.")),
        ("stderr-tty", internal(false, [ValueType::Boolean]).description("Whether stderr is a terminal.")),
        ("term", internal(Value::Null, [ValueType::String]).description("The TERM environment variable.")),
        ("cafile-contents", internal(Value::Null, [ValueType::String]).description("The text of the configured cafile.")),
        ("npm-command", internal(Value::Null, [ValueType::String]).description("The command being run.")),
        ("npm-args", internal(json!([]), [ValueType::String, ValueType::Array]).description("Positional arguments of the command being run.")),
        ("npm-bin", internal(Value::Null, [ValueType::String]).description("The path of the npm executable.")),
        ("node-bin", internal(Value::Null, [ValueType::String]).description("The path of the node executable.")),
        ("hash-algorithm", internal("sha1", [ValueType::String]).description("The integrity hash algorithm.")),
    ]
}
