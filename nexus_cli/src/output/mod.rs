use crate::cli::OutputFormat;
use crate::commands::Result;
use nexus_core::store::{BlogPost, SearchHistoryEntry, User};
use nexus_core::AggregationResponse;
use serde::Serialize;
use serde_json::Value;

mod pretty;
pub use pretty::{
    format_aggregation, format_blog, format_blog_table, format_history, format_prose, format_user,
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    Aggregation(AggregationResponse),
    Explanation { term: String, text: String },
    Generated { text: String },
    Blogs(Vec<BlogPost>),
    Blog(BlogPost),
    User(User),
    Session { user: User, token: String },
    History(Vec<SearchHistoryEntry>),
    ConfigInfo(Value),
    Message(String),
}

pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text => {
            print!("{}", format_text(data)?);
        }
        OutputFormat::Pretty => {
            print!("{}", format_pretty(data)?);
        }
    }
    Ok(())
}

fn format_pretty(data: &OutputData) -> Result<String> {
    Ok(match data {
        OutputData::Aggregation(response) => format_aggregation(response),
        OutputData::Explanation { term, text } => format_prose(term, text),
        OutputData::Generated { text } => format_prose("Response", text),
        OutputData::Blogs(posts) => format_blog_table(posts),
        OutputData::Blog(post) => format_blog(post),
        OutputData::User(user) => format_user(user, None),
        OutputData::Session { user, token } => format_user(user, Some(token)),
        OutputData::History(entries) => format_history(entries),
        OutputData::ConfigInfo(value) => serde_yaml::to_string(value)?,
        OutputData::Message(message) => format!("{}\n", message),
    })
}

/// Plain text: one record per line, no colour, easy to pipe.
fn format_text(data: &OutputData) -> Result<String> {
    let mut out = String::new();
    match data {
        OutputData::Aggregation(response) => {
            for record in &response.results {
                out.push_str(&format!(
                    "[{}] {} | {} | {}\n",
                    record.kind, record.title, record.source_label, record.url
                ));
            }
            if let Some(summary) = &response.narrative_summary {
                out.push_str(&format!("\n{}\n", summary));
            }
        }
        OutputData::Explanation { text, .. } | OutputData::Generated { text } => {
            out.push_str(text);
            out.push('\n');
        }
        OutputData::Blogs(posts) => {
            for post in posts {
                out.push_str(&format!("{}\t{}\t{}\n", post.id, post.slug, post.title));
            }
        }
        OutputData::Blog(post) => {
            out.push_str(&format!("{}\n\n{}\n", post.title, post.content));
        }
        OutputData::User(user) => {
            out.push_str(&format!("{}\t{}\n", user.id, user.email));
        }
        OutputData::Session { token, .. } => {
            out.push_str(token);
            out.push('\n');
        }
        OutputData::History(entries) => {
            for entry in entries {
                out.push_str(&format!(
                    "{}\t{}\t{}\t{}\n",
                    entry.created_at.to_rfc3339(),
                    entry.search_type,
                    entry.results_count,
                    entry.query
                ));
            }
        }
        OutputData::ConfigInfo(value) => {
            out.push_str(&serde_yaml::to_string(value)?);
        }
        OutputData::Message(message) => {
            out.push_str(message);
            out.push('\n');
        }
    }
    Ok(out)
}
