/// Actions that a user or application can initiate on the intention tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction<Custom = ()> {
    /// Move selection to the previous visible row.
    SelectPrev,
    /// Move selection to the next visible row.
    SelectNext,
    /// Move selection to the parent category.
    SelectParent,
    /// Expand the selection; if possible, move to an expandable descendant.
    SelectChild,
    /// Select the first visible row.
    SelectFirst,
    /// Select the last visible row.
    SelectLast,
    /// Toggle expansion for the selected category only.
    ToggleNode,
    /// Toggle expansion recursively for the selected subtree.
    ToggleRecursive,
    /// Expand every category (toolbar "expand all").
    ExpandAll,
    /// Collapse every category (toolbar "collapse all").
    CollapseAll,
    /// Flip the check flag of the selected node.
    ToggleCheck,
    /// Toggle drawing of guide lines.
    ToggleGuides,
    /// Move keyboard focus to the filter field.
    FocusFilter,
    /// Custom action forwarded to the caller without internal handling.
    Custom(Custom),
}

/// Result of handling an action or key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent<Custom = ()> {
    /// The action was handled internally and state was updated.
    Handled,
    /// The action was ignored (e.g., nothing selected / nothing to do).
    Unhandled,
    /// The action is forwarded to the caller for handling.
    Action(TreeAction<Custom>),
}
