// Minimal example: build a panel from in-memory settings and render it into a buffer.
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_intentiontree::{
    IntentionMeta, IntentionPanel, IntentionPanelView, IntentionSettings, IntentionTreeStyle,
    MemorySettings, NoPendingWork, PanelConfig, SubstringFilter,
};

fn main() -> tui_intentiontree::Result<()> {
    // The settings source owns the enabled flags.
    let mut settings = MemorySettings::new()
        .with(IntentionMeta::new(["Rust", "Style"], "Use let-else"), true)
        .with(IntentionMeta::new(["Rust", "Style"], "Inline format args"), false)
        .with(IntentionMeta::new(["Rust"], "Add derive"), false);

    // The host answers filter queries; here a plain substring match.
    let host = SubstringFilter::new(settings.intentions());
    let mut panel = IntentionPanel::with_config(host, PanelConfig::default().ascii_glyphs(true));
    panel.reset(&settings, &NoPendingWork)?;

    // Toggle one intention, then narrow the view.
    panel.select_intention("Add derive");
    panel.toggle_selected();
    panel.set_filter("rust")?;

    let area = Rect::new(0, 0, 48, 9);
    let mut buffer = Buffer::empty(area);
    IntentionPanelView::new(IntentionTreeStyle::default()).render(area, &mut buffer, &mut panel);

    for y in 0..area.height {
        let line: String = (0..area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect();
        println!("{line}");
    }

    println!("modified: {}", panel.is_modified(&settings));
    panel.apply(&mut settings);
    println!("modified after apply: {}", panel.is_modified(&settings));
    Ok(())
}
