//! Subcommand handlers

use std::path::Path;

use rgdir_api::{ApiClient, MemberId, MemberListQuery, PhotoUpload, PublicationId};
use rgdir_core::{
    ConferenceForm, Directory, DirectoryConfig, DirectoryError, ListingState, ProfileForm,
    PublicationEditor,
};

use crate::render;
use crate::{Commands, ShowArgs};

type CliResult = Result<(), Box<dyn std::error::Error>>;

pub async fn dispatch(command: Commands, config: &DirectoryConfig) -> CliResult {
    if let Commands::Config = command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let directory = Directory::new(ApiClient::new(&config.api)?, config.cache.clone());

    match command {
        Commands::Members { page, size } => {
            let query = MemberListQuery {
                page: page.saturating_sub(1),
                size,
                ..MemberListQuery::default()
            };
            let members = directory.members(&query).await?;
            if members.is_empty() {
                println!("No members yet.");
            } else {
                println!("{}", render::members_table(&members));
                println!(
                    "Page {} of {} ({} members)",
                    page.max(1),
                    members.total_pages,
                    members.total_elements
                );
            }
        }
        Commands::FetchMember {
            source_id,
            provider,
        } => {
            let member = directory.fetch_new_member(&source_id, provider).await?;
            println!("Imported {} as member #{}", member.name, member.id);
        }
        Commands::Show(args) => show(&directory, config, args).await?,
        Commands::Conferences { member_id } => {
            print_conferences(&directory.conferences(member_id).await?);
        }
        Commands::AddConference {
            member_id,
            name,
            year,
            location,
            description,
        } => {
            let mut form = ConferenceForm {
                name,
                year,
                location,
                description,
            };
            let created = directory.add_conference(member_id, &mut form).await?;
            println!("Added {} ({})", created.name, created.year.unwrap_or_default());
        }
        Commands::EditProfile {
            member_id,
            description,
            photo,
        } => edit_profile(&directory, member_id, description, photo.as_deref()).await?,
        Commands::EditPublication {
            member_id,
            publication_id,
            add_tags,
            remove_tags,
            publication_type,
        } => {
            edit_publication(
                &directory,
                member_id,
                publication_id,
                &add_tags,
                &remove_tags,
                publication_type.as_deref(),
            )
            .await?
        }
        Commands::WorkTypes => {
            for kind in directory.work_types().await? {
                println!("{}", kind);
            }
        }
        Commands::Config => {}
    }

    directory.shutdown();
    Ok(())
}

fn print_conferences(conferences: &[rgdir_api::Conference]) {
    if conferences.is_empty() {
        println!("No conferences yet.");
    } else {
        println!("{}", render::conferences_table(conferences));
    }
}

async fn show(
    directory: &Directory<ApiClient>,
    config: &DirectoryConfig,
    args: ShowArgs,
) -> CliResult {
    let mut listing = ListingState::new();
    listing.set_sort(args.sort);
    listing.set_page_size(args.size);
    for kind in &args.types {
        listing.toggle_type(kind);
    }
    for tag in &args.tags {
        listing.toggle_tag(tag);
    }
    listing.set_page(args.page);

    let detail = directory
        .load_detail(args.member_id, &listing, args.open_year.as_deref())
        .await;

    match &detail.member {
        Ok(member) => {
            let photo = config.api.photo_url(member.photo_path.as_deref());
            print!("{}", render::profile(member, photo.as_deref()));
        }
        Err(err) => println!("Could not load member: {}", err),
    }

    match &detail.counts_by_year {
        Some(Ok(counts)) if counts.is_empty() => println!("\nNo yearly data."),
        Some(Ok(counts)) => {
            println!("\nWorks per year");
            print!("{}", render::year_chart(counts));
        }
        Some(Err(err)) => println!("\nCould not load yearly counts: {}", err),
        None => {}
    }

    println!("\nConferences");
    match &detail.conferences {
        Ok(conferences) => print_conferences(conferences),
        Err(err) => println!("Could not load conferences: {}", err),
    }

    println!("\nPublications, sorted by {}", listing.sort().label());
    match &detail.metadata {
        Ok(metadata) => print!("{}", render::filters(metadata, &listing)),
        Err(err) => println!("Could not load filters: {}", err),
    }
    match (&detail.view, &detail.publications) {
        (Some(view), _) => print!("{}", render::publications(view)),
        (None, Err(err)) => println!("Could not load publications: {}", err),
        (None, Ok(_)) => {}
    }

    detail.member.map(|_| ()).map_err(Into::into)
}

async fn edit_profile(
    directory: &Directory<ApiClient>,
    member_id: MemberId,
    description: Option<String>,
    photo: Option<&Path>,
) -> CliResult {
    let mut member = directory.member(member_id).await?;
    let mut form = ProfileForm::for_member(&member);
    if let Some(description) = description {
        form.description = description;
    }
    if let Some(path) = photo {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo")
            .to_string();
        form.photo = Some(PhotoUpload::new(file_name, bytes));
    }

    let plan = directory.save_profile(&mut member, &mut form).await?;
    if plan.is_empty() {
        println!("Nothing to save.");
    }
    if plan.description.is_some() {
        println!("Description updated.");
    }
    if let Some(photo) = &plan.photo {
        println!("Uploaded {}.", photo.file_name);
    }
    Ok(())
}

async fn edit_publication(
    directory: &Directory<ApiClient>,
    member_id: MemberId,
    publication_id: PublicationId,
    add_tags: &[String],
    remove_tags: &[String],
    publication_type: Option<&str>,
) -> CliResult {
    // Year sorts load every publication, so the target is always on the page
    let query = ListingState::new().query(member_id);
    let page = directory.publications(&query).await?;
    let publication = page.find(publication_id).ok_or_else(|| {
        DirectoryError::NotFound(format!(
            "publication #{} of member #{}",
            publication_id, member_id
        ))
    })?;

    let mut editor = PublicationEditor::new();
    editor.open(publication)?;
    for tag in add_tags {
        editor.add_tag(tag)?;
    }
    for tag in remove_tags {
        editor.remove_tag(tag)?;
    }
    if let Some(kind) = publication_type {
        let known = directory.work_types().await?;
        if !known.iter().any(|k| k == kind) {
            tracing::warn!(publication_type = kind, "not one of the provider's work types");
        }
        editor.set_type(kind)?;
    }

    let plan = directory.save_publication_edits(&mut editor, &query).await?;
    if plan.is_empty() {
        println!("Nothing to save.");
    } else {
        println!(
            "Saved {} change(s) to publication #{}",
            plan.call_count(),
            publication_id
        );
    }
    Ok(())
}
