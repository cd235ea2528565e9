use std::fmt;

/// Identifies a resource collection, an optional instance and an optional
/// sub-action on that instance or collection.
///
/// ```
/// use awx_client::ResourceKey;
///
/// let key = ResourceKey::new("job_templates").id(7).action("launch");
/// assert_eq!(key.path(), "job_templates/7/launch/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// Resource collection name, e.g. "jobs"
    pub resource: String,
    /// Optional instance identifier
    pub id: Option<String>,
    /// Optional sub-action, e.g. "cancel"
    pub action: Option<String>,
}

impl ResourceKey {
    /// Create a key addressing a whole collection
    pub fn new(resource: impl Into<String>) -> Self {
        ResourceKey {
            resource: resource.into(),
            id: None,
            action: None,
        }
    }

    /// Refine the key to a single instance
    pub fn id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Refine the key to a sub-action
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Relative request path for this key
    pub fn path(&self) -> String {
        locate(&self.resource, self.id.as_deref(), self.action.as_deref())
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Build a relative path from a resource name, instance id and action.
///
/// Empty id or action values count as absent. A trailing slash is only
/// appended when an action is present.
pub fn locate(resource: &str, id: Option<&str>, action: Option<&str>) -> String {
    let mut path = resource.to_string();
    if let Some(id) = id.filter(|s| !s.is_empty()) {
        path.push('/');
        path.push_str(id);
    }
    if let Some(action) = action.filter(|s| !s.is_empty()) {
        path.push('/');
        path.push_str(action);
        path.push('/');
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_collection() {
        assert_eq!(locate("jobs", None, None), "jobs");
        assert_eq!(ResourceKey::new("jobs").path(), "jobs");
    }

    #[test]
    fn test_locate_instance() {
        assert_eq!(locate("schedules", Some("1"), None), "schedules/1");
        assert_eq!(ResourceKey::new("schedules").id(1).to_string(), "schedules/1");
    }

    #[test]
    fn test_locate_action() {
        assert_eq!(locate("jobs", Some("1"), Some("cancel")), "jobs/1/cancel/");
        assert_eq!(
            ResourceKey::new("job_templates").id("1").action("schedules").path(),
            "job_templates/1/schedules/"
        );
    }

    #[test]
    fn test_locate_action_without_id() {
        assert_eq!(locate("config", None, Some("subscriptions")), "config/subscriptions/");
    }

    #[test]
    fn test_locate_ignores_empty_parts() {
        assert_eq!(locate("jobs", Some(""), Some("")), "jobs");
        assert_eq!(locate("jobs", Some(""), Some("relaunch")), "jobs/relaunch/");
    }
}
