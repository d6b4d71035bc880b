use std::collections::HashMap;

/// Framework callbacks invoked by the engine runtime rather than by user code.
#[derive(Debug, Clone)]
pub struct FrameworkPatterns {
    pub hooks: Vec<LifecycleHook>,
    /// Generic component lookup methods, e.g. `GetComponent<T>()`.
    pub lookup_methods: Vec<String>,
    /// Static accessors that expose a single shared instance.
    pub singleton_accessors: Vec<String>,
    hook_index: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct LifecycleHook {
    pub name: String,
    pub phase: LifecyclePhase,
    /// Relative invocation order within one frame; lower runs first.
    pub execution_order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Initialization,
    Update,
    FixedUpdate,
    LateUpdate,
    Physics,
    Input,
    Rendering,
    Application,
    Teardown,
}

impl FrameworkPatterns {
    pub fn new() -> Self {
        Self {
            hooks: Vec::new(),
            lookup_methods: Vec::new(),
            singleton_accessors: Vec::new(),
            hook_index: HashMap::new(),
        }
    }

    pub fn with_default_patterns() -> Self {
        let mut patterns = Self::new();
        patterns.add_initialization_hooks();
        patterns.add_update_hooks();
        patterns.add_physics_hooks();
        patterns.add_input_hooks();
        patterns.add_rendering_hooks();
        patterns.add_application_hooks();
        patterns.add_teardown_hooks();
        patterns.add_lookup_methods();
        patterns
    }

    pub fn add_hook(&mut self, name: &str, phase: LifecyclePhase, execution_order: u32) {
        self.hook_index.insert(name.to_string(), self.hooks.len());
        self.hooks.push(LifecycleHook {
            name: name.to_string(),
            phase,
            execution_order,
        });
    }

    fn add_initialization_hooks(&mut self) {
        use LifecyclePhase::Initialization;
        for (order, name) in ["Awake", "OnEnable", "Start", "Reset", "OnValidate"].iter().enumerate() {
            self.add_hook(name, Initialization, 1 + order as u32);
        }
    }

    fn add_update_hooks(&mut self) {
        self.add_hook("Update", LifecyclePhase::Update, 100);
        self.add_hook("FixedUpdate", LifecyclePhase::FixedUpdate, 101);
        self.add_hook("LateUpdate", LifecyclePhase::LateUpdate, 102);
    }

    fn add_physics_hooks(&mut self) {
        let callbacks = [
            "OnTriggerEnter",
            "OnTriggerStay",
            "OnTriggerExit",
            "OnCollisionEnter",
            "OnCollisionStay",
            "OnCollisionExit",
            "OnControllerColliderHit",
        ];

        let mut order = 200;
        for name in callbacks {
            self.add_hook(name, LifecyclePhase::Physics, order);
            order += 1;
        }
        // No 2D variant of the character controller callback.
        for name in callbacks.iter().take(6) {
            self.add_hook(&format!("{}2D", name), LifecyclePhase::Physics, order);
            order += 1;
        }
    }

    fn add_input_hooks(&mut self) {
        let callbacks = [
            "OnMouseDown",
            "OnMouseUp",
            "OnMouseUpAsButton",
            "OnMouseEnter",
            "OnMouseOver",
            "OnMouseExit",
            "OnMouseDrag",
        ];
        for (offset, name) in callbacks.iter().enumerate() {
            self.add_hook(name, LifecyclePhase::Input, 300 + offset as u32);
        }
    }

    fn add_rendering_hooks(&mut self) {
        let callbacks = [
            "OnWillRenderObject",
            "OnPreRender",
            "OnRenderObject",
            "OnPostRender",
            "OnBecameVisible",
            "OnBecameInvisible",
            "OnDrawGizmos",
            "OnDrawGizmosSelected",
            "OnGUI",
        ];
        for (offset, name) in callbacks.iter().enumerate() {
            self.add_hook(name, LifecyclePhase::Rendering, 400 + offset as u32);
        }
    }

    fn add_application_hooks(&mut self) {
        use LifecyclePhase::Application;
        self.add_hook("OnApplicationFocus", Application, 450);
        self.add_hook("OnApplicationPause", Application, 451);
        self.add_hook("OnApplicationQuit", Application, 499);
    }

    fn add_teardown_hooks(&mut self) {
        use LifecyclePhase::Teardown;
        self.add_hook("OnDisable", Teardown, 500);
        self.add_hook("OnDestroy", Teardown, 501);
    }

    fn add_lookup_methods(&mut self) {
        self.lookup_methods = [
            "GetComponent",
            "GetComponents",
            "GetComponentInChildren",
            "GetComponentsInChildren",
            "GetComponentInParent",
            "GetComponentsInParent",
            "TryGetComponent",
            "FindObjectOfType",
            "FindObjectsOfType",
            "FindFirstObjectByType",
            "FindAnyObjectByType",
            "FindObjectsByType",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        self.singleton_accessors = vec!["Instance".to_string(), "Singleton".to_string()];
    }

    pub fn hook(&self, name: &str) -> Option<&LifecycleHook> {
        self.hook_index.get(name).and_then(|&idx| self.hooks.get(idx))
    }

    pub fn is_lifecycle_hook(&self, name: &str) -> bool {
        self.hook(name).is_some()
    }

    /// Execution order for sorting; unknown names sort last.
    pub fn execution_order(&self, name: &str) -> u32 {
        self.hook(name).map(|h| h.execution_order).unwrap_or(1000)
    }

    pub fn phase(&self, name: &str) -> Option<LifecyclePhase> {
        self.hook(name).map(|h| h.phase)
    }
}

impl Default for FrameworkPatterns {
    fn default() -> Self {
        Self::with_default_patterns()
    }
}
