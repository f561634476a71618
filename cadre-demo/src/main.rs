use std::fs::File;
use std::time::Duration;

use cadre::page::ListenerId;
use cadre::prelude::*;
use simplelog::{Config, LevelFilter, WriteLogger};

/// Addon state: the listener it attached to the root.
struct Announcer {
    listener: ListenerId,
}

fn navigation() -> Element {
    let menu = |name: &str, entries: &[&str]| {
        let id = name.to_lowercase();
        [
            Element::button(name)
                .id(format!("{id}-handle"))
                .data("role", "dropdown-handle"),
            Element::div()
                .id(format!("{id}-content"))
                .data("role", "dropdown-content")
                .children(entries.iter().map(|entry| Element::button(*entry))),
        ]
    };

    Element::div().id("page").child(
        Element::new("nav")
            .id("nav")
            .data("addons", "announce")
            .data("throttle-delay", "150")
            .children(menu("File", &["New", "Open", "Save"]))
            .children(menu("Edit", &["Undo", "Redo"]))
            .children(menu("View", &["Zoom in", "Zoom out"])),
    )
}

fn describe(page: &Page, dropdown: &Dropdown) -> String {
    (0..dropdown.pair_count(page))
        .map(|index| format!("{}:{:?}", index, dropdown.phase(page, index)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::main]
async fn main() {
    let log_path = std::env::temp_dir().join("cadre-demo.log");
    let log_file = File::create(&log_path).expect("Failed to create log file");
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .expect("Failed to initialize logger");

    let mut page = Page::new(navigation());
    let Some(nav) = page.find("nav") else {
        eprintln!("Error: navigation root missing");
        return;
    };

    let dropdowns = Dropdown::widget_type();
    dropdowns.set_default_options(serde_json::json!({ "activeDropdownClass": "is-open" }));
    dropdowns.register_addon(
        "announce",
        |page: &mut Page, instance: &WidgetInstance<Dropdown>| {
            let listener = page.listen(instance.root(), "dropdownExpand", |_page, event| {
                log::info!("[demo] menu {:?} opened", event.index());
                Retain::Keep
            });
            Ok(Announcer { listener })
        },
    );

    let instance = dropdowns.construct(&mut page, nav);
    let dropdown = instance.widget().clone();
    println!(
        "{} #{} with {} menus, addons {:?}",
        dropdowns.name(),
        instance.index(),
        dropdown.pair_count(&page),
        instance.addons()
    );
    if let Some(announcer) = instance.addon::<Announcer>("announce") {
        log::debug!("[demo] announce listener {:?}", announcer.listener);
    }

    // Keyboard: focus the first handle, let it open.
    if let Some(file) = dropdown.handle(&page, 0) {
        page.focus(file);
    }
    page.run_until_idle().await;
    println!("after focus:  {}", describe(&page, &dropdown));

    // Pointer: click the second handle twice, waiting out the throttle.
    if let Some(edit) = dropdown.handle(&page, 1) {
        page.click(edit);
        page.run_until_idle().await;
        println!("after click:  {}", describe(&page, &dropdown));
        page.click(edit);
        page.run_until_idle().await;
        println!("after click:  {}", describe(&page, &dropdown));
    }

    // Hover keeps a closing menu open until the pointer leaves.
    if let Some(view) = dropdown.expander(&page, 2) {
        dropdown.expand(&mut page, 2, Duration::ZERO);
        page.run_until_idle().await;
        dropdown.collapse(&mut page, 2, Duration::from_millis(200));
        page.hover(view);
        page.run_until_idle().await;
        println!("while hovered: {}", describe(&page, &dropdown));
        page.leave(view);
        page.run_until_idle().await;
        println!("after leave:  {}", describe(&page, &dropdown));
    }

    println!("log written to {}", log_path.display());
}
