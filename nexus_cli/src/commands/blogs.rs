use crate::cli::{BlogsAction, Cli};
use crate::commands::{load_config, open_store, require_user, CommandError, Result};
use crate::output::{format_output, OutputData};
use nexus_core::store::{BlogListQuery, BlogStatus, BlogUpdate, NewBlog};
use std::path::Path;

pub async fn run(cli: &Cli, action: BlogsAction) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(&config).await?;

    let output = match action {
        BlogsAction::List {
            featured,
            search,
            limit,
            offset,
        } => {
            let query = BlogListQuery {
                featured,
                search,
                limit: limit.max(1),
                offset: offset.max(0),
            };
            OutputData::Blogs(store.list_published(&query).await?)
        }
        BlogsAction::Mine { status, token } => {
            let user_id = require_user(&config, token.as_deref())?;
            let status: BlogStatus = status.parse().map_err(CommandError::InvalidInput)?;
            OutputData::Blogs(store.list_for_user(&user_id, status).await?)
        }
        BlogsAction::Get { slug } => OutputData::Blog(store.get_published_by_slug(&slug).await?),
        BlogsAction::Create {
            title,
            content,
            content_file,
            excerpt,
            slug,
            tags,
            cover_image_url,
            publish,
            token,
        } => {
            let user_id = require_user(&config, token.as_deref())?;
            let content = read_content(content, content_file.as_deref())?;
            let new = NewBlog {
                title,
                content,
                excerpt,
                slug,
                tags,
                cover_image_url,
                reading_time: None,
                is_published: publish,
            };
            OutputData::Blog(store.create_blog(&user_id, new).await?)
        }
        BlogsAction::Update {
            id,
            title,
            content,
            excerpt,
            slug,
            tags,
            cover_image_url,
            published,
            featured,
            token,
        } => {
            let user_id = require_user(&config, token.as_deref())?;
            let update = BlogUpdate {
                title,
                content,
                excerpt,
                slug,
                tags,
                cover_image_url,
                reading_time: None,
                is_published: published,
                is_featured: featured,
            };
            OutputData::Blog(store.update_blog(&id, &user_id, update).await?)
        }
        BlogsAction::Delete { id, token } => {
            let user_id = require_user(&config, token.as_deref())?;
            store.delete_blog(&id, &user_id).await?;
            OutputData::Message(format!("Deleted blog {}", id))
        }
    };

    format_output(&output, &cli.output)
}

fn read_content(inline: Option<String>, file: Option<&Path>) -> Result<String> {
    match (inline, file) {
        (Some(content), _) => Ok(content),
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (None, None) => Err(CommandError::InvalidInput(
            "provide --content or --content-file".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn content_from_flag_or_file() {
        assert_eq!(read_content(Some("inline".into()), None).unwrap(), "inline");

        let dir = std::env::temp_dir().join(format!("nexus-cli-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("post.md");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"# From disk")
            .unwrap();
        assert_eq!(read_content(None, Some(&path)).unwrap(), "# From disk");
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(
            read_content(None, None),
            Err(CommandError::InvalidInput(_))
        ));
    }
}
