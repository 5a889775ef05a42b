// Attesta CLI - operator tooling for the certificate engine

mod record;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};
use uuid::Uuid;

use record::CertificateRecord;

/// Attesta - Certificate Issuance & Verification Tool
#[derive(Parser)]
#[command(name = "attesta")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the Attesta server
    #[arg(long, global = true, env = "ATTESTA_SERVER", default_value = "http://localhost:4000")]
    server: String,

    /// Caller user id, sent as X-User-Id (institution operators only)
    #[arg(long, global = true, env = "ATTESTA_USER")]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a certificate (or a batch with --batch)
    Issue {
        /// Full legal name of the certificate holder
        #[arg(long)]
        full_name: Option<String>,

        /// Program or degree
        #[arg(long)]
        program: Option<String>,

        /// Field of study
        #[arg(long)]
        field: Option<String>,

        /// Issuance date (YYYY-MM-DD)
        #[arg(long)]
        issued: Option<String>,

        /// Optional expiry date (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<String>,

        /// Path to a JSON file with an array of claims for bulk issuance
        #[arg(long, value_name = "FILE", conflicts_with_all = ["full_name", "program", "field", "issued", "expires"])]
        batch: Option<String>,
    },
    /// Verify a certificate against the server
    Verify {
        /// The certificate identifier to check
        certificate_id: String,
    },
    /// Revoke a certificate (one-way; cannot be undone)
    Revoke {
        /// The certificate identifier to revoke
        certificate_id: String,
    },
    /// List your institution's certificates
    List,
    /// Recompute a saved record's fingerprint offline
    Fingerprint {
        /// Path to a certificate record JSON file
        path: String,
    },
    /// Render a saved record's artifact offline
    Render {
        /// Path to a certificate record JSON file
        path: String,

        /// Output file path
        #[arg(short, long, default_value = "certificate.pdf")]
        output: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let client = Client {
        server: cli.server.trim_end_matches('/').to_string(),
        user: cli.user,
    };

    let result = match cli.command {
        Commands::Issue {
            full_name,
            program,
            field,
            issued,
            expires,
            batch,
        } => match batch {
            Some(path) => handle_bulk(&client, &path),
            None => handle_issue(&client, full_name, program, field, issued, expires),
        },
        Commands::Verify { certificate_id } => handle_verify(&client, &certificate_id),
        Commands::Revoke { certificate_id } => handle_revoke(&client, &certificate_id),
        Commands::List => handle_list(&client),
        Commands::Fingerprint { path } => handle_fingerprint(&path),
        Commands::Render { path, output } => handle_render(&client, &path, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct Client {
    server: String,
    user: Option<Uuid>,
}

impl Client {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.server, path)
    }

    fn require_user(&self) -> anyhow::Result<Uuid> {
        self.user
            .ok_or_else(|| anyhow::anyhow!("this command needs --user (or ATTESTA_USER)"))
    }

    fn post(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        let user = self.require_user()?;
        let response = ureq::post(&self.url(path))
            .set("X-User-Id", &user.to_string())
            .send_json(body)
            .map_err(flatten_http_error)?;
        Ok(response.into_json()?)
    }

    fn get(&self, path: &str, authenticated: bool) -> anyhow::Result<Value> {
        let mut request = ureq::get(&self.url(path));
        if authenticated {
            let user = self.require_user()?;
            request = request.set("X-User-Id", &user.to_string());
        }
        let response = request.call().map_err(flatten_http_error)?;
        Ok(response.into_json()?)
    }
}

/// Turns an HTTP error status into the server's error message where the
/// body carries one.
fn flatten_http_error(error: ureq::Error) -> anyhow::Error {
    match error {
        ureq::Error::Status(code, response) => {
            let detail = response
                .into_json::<Value>()
                .ok()
                .and_then(|body| {
                    body.get("error")
                        .or_else(|| body.get("message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("server returned status {code}"));
            anyhow::anyhow!("{detail}")
        }
        other => anyhow::anyhow!("{other}"),
    }
}

fn handle_issue(
    client: &Client,
    full_name: Option<String>,
    program: Option<String>,
    field: Option<String>,
    issued: Option<String>,
    expires: Option<String>,
) -> anyhow::Result<()> {
    let mut claim = json!({
        "fullName": full_name.ok_or_else(|| anyhow::anyhow!("--full-name is required"))?,
        "program": program.ok_or_else(|| anyhow::anyhow!("--program is required"))?,
        "fieldOfStudy": field.ok_or_else(|| anyhow::anyhow!("--field is required"))?,
        "issuedAt": issued.ok_or_else(|| anyhow::anyhow!("--issued is required"))?,
    });
    if let Some(expires) = expires {
        claim["expiresAt"] = json!(expires);
    }

    let body = client.post("/certificates", claim)?;
    println!("{} Certificate issued", "✓".green().bold());
    println!();
    println!("  ID:     {}", field_str(&body, "certificateId"));
    println!("  Holder: {}", field_str(&body, "fullName"));
    println!("  Hash:   {}", field_str(&body, "integrityHash"));
    match body.get("artifactLocator").and_then(Value::as_str) {
        Some(locator) => println!("  PDF:    {}", locator),
        None => println!(
            "  PDF:    {} (retry with the artifact endpoint)",
            "pending".yellow()
        ),
    }
    Ok(())
}

fn handle_bulk(client: &Client, path: &str) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", path, e))?;
    let claims: Value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse '{}': {}", path, e))?;
    if !claims.is_array() {
        return Err(anyhow::anyhow!("'{path}' must contain a JSON array of claims"));
    }

    let body = client.post("/certificates/bulk", json!({ "claims": claims }))?;
    let issued = body["issued"].as_u64().unwrap_or(0);
    let failed = body["failed"].as_u64().unwrap_or(0);

    println!("Issued {issued}, failed {failed}");
    println!();
    if let Some(items) = body["items"].as_array() {
        for (index, item) in items.iter().enumerate() {
            match item.get("error").and_then(Value::as_str) {
                Some(error) => {
                    println!("  {} claim {}: {}", "✗".red().bold(), index + 1, error)
                }
                None => println!(
                    "  {} claim {}: {}",
                    "✓".green().bold(),
                    index + 1,
                    field_str(item, "certificateId")
                ),
            }
        }
    }
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn handle_verify(client: &Client, certificate_id: &str) -> anyhow::Result<()> {
    let path = format!("/verify?certificateId={certificate_id}");
    let response = ureq::get(&client.url(&path)).call();

    let (status, body) = match response {
        Ok(response) => (response.status(), response.into_json::<Value>()?),
        Err(ureq::Error::Status(code, response)) => {
            (code, response.into_json::<Value>().unwrap_or(Value::Null))
        }
        Err(other) => return Err(anyhow::anyhow!("{other}")),
    };

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("no detail from server");

    if status == 200 {
        println!("{} {}", "✓".green().bold(), message.green());
        println!();
        let data = &body["data"];
        println!("  Holder:  {}", field_str(data, "fullName"));
        println!("  Program: {}", field_str(data, "program"));
        println!("  Field:   {}", field_str(data, "fieldOfStudy"));
        println!("  Issued:  {}", field_str(data, "issuedAt"));
        println!("  Issuer:  {}", field_str(data, "issuerName"));
        println!("  Hash:    {}", field_str(data, "integrityHash"));
        if let Some(locator) = data.get("artifactLocator").and_then(Value::as_str) {
            println!("  PDF:     {}", locator);
        }
        Ok(())
    } else {
        eprintln!("{} {}", "✗".red().bold(), message.red());
        std::process::exit(1);
    }
}

fn handle_revoke(client: &Client, certificate_id: &str) -> anyhow::Result<()> {
    client.post(&format!("/certificates/{certificate_id}/revoke"), json!({}))?;
    println!(
        "{} Certificate {} revoked",
        "✓".green().bold(),
        certificate_id
    );
    Ok(())
}

fn handle_list(client: &Client) -> anyhow::Result<()> {
    let body = client.get("/certificates", true)?;
    let certificates = body
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("unexpected response shape from server"))?;

    if certificates.is_empty() {
        println!("No certificates issued yet.");
        return Ok(());
    }

    for certificate in certificates {
        let status = field_str(certificate, "status");
        let marker = if status == "revoked" {
            "revoked".red().to_string()
        } else {
            "valid".green().to_string()
        };
        println!(
            "{}  {}  {} — {}",
            field_str(certificate, "certificateId"),
            marker,
            field_str(certificate, "fullName"),
            field_str(certificate, "program"),
        );
    }
    Ok(())
}

fn handle_fingerprint(path: &str) -> anyhow::Result<()> {
    let record = CertificateRecord::load(path)?;
    let computed = attesta_crypto::fingerprint(&record.fingerprint_input())?;

    if computed == record.integrity_hash {
        println!("{} {}", "✓".green().bold(), "Fingerprint matches".green());
        println!();
        println!("  Certificate: {}", record.certificate_id);
        println!("  Hash:        {}", computed);
        Ok(())
    } else {
        eprintln!("{} {}", "✗".red().bold(), "Fingerprint mismatch".red());
        eprintln!();
        eprintln!("  Stored:   {}", record.integrity_hash);
        eprintln!("  Computed: {}", computed);
        eprintln!();
        eprintln!("  The record's covered fields changed after issuance.");
        std::process::exit(1);
    }
}

fn handle_render(client: &Client, path: &str, output: &str) -> anyhow::Result<()> {
    let record = CertificateRecord::load(path)?;
    let verify_url = format!(
        "{}/verify?certificateId={}",
        client.server, record.certificate_id
    );
    let bytes = attesta_render::render_certificate(&record.document(&verify_url))?;
    std::fs::write(output, &bytes)
        .map_err(|e| anyhow::anyhow!("Failed to write '{}': {}", output, e))?;

    println!("{} Artifact written to: {}", "✓".green().bold(), output);
    println!("  QR target: {}", verify_url);
    Ok(())
}

fn field_str<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("-")
}
