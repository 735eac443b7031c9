//! Selector/protocol membership queries over static interface descriptors.
//!
//! Rust checks trait conformance at compile time, so nothing in the
//! coordinator needs this. It exists for hosts that dispatch dynamically
//! (plugin bridges, scripting layers) and need to ask whether a named
//! callback belongs to one of the crate's interfaces before routing it.

/// One method declared by an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Method name.
    pub selector: &'static str,
    /// Whether implementors must provide it.
    pub required: bool,
    /// Whether it is called on an instance (as opposed to the type).
    pub instance: bool,
}

impl MethodDescriptor {
    /// Required instance method.
    pub const fn required_instance(selector: &'static str) -> Self {
        Self {
            selector,
            required: true,
            instance: true,
        }
    }

    /// Optional instance method.
    pub const fn optional_instance(selector: &'static str) -> Self {
        Self {
            selector,
            required: false,
            instance: true,
        }
    }

    /// Required associated (type-level) function.
    pub const fn required_static(selector: &'static str) -> Self {
        Self {
            selector,
            required: true,
            instance: false,
        }
    }

    /// Optional associated (type-level) function.
    pub const fn optional_static(selector: &'static str) -> Self {
        Self {
            selector,
            required: false,
            instance: false,
        }
    }
}

/// Static description of an interface's methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    /// Interface name.
    pub name: &'static str,
    /// Declared methods.
    pub methods: &'static [MethodDescriptor],
}

impl ProtocolDescriptor {
    /// Iterate declared selectors.
    pub fn selectors(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.iter().map(|m| m.selector)
    }
}

/// Methods of [`crate::LocationObserver`]. All optional.
pub const LOCATION_OBSERVER_PROTOCOL: ProtocolDescriptor = ProtocolDescriptor {
    name: "LocationObserver",
    methods: &[
        MethodDescriptor::optional_instance("on_readings"),
        MethodDescriptor::optional_instance("on_authorization_changed"),
        MethodDescriptor::optional_instance("on_error"),
    ],
};

/// Methods of [`crate::LocationProvider`].
pub const LOCATION_PROVIDER_PROTOCOL: ProtocolDescriptor = ProtocolDescriptor {
    name: "LocationProvider",
    methods: &[
        MethodDescriptor::required_instance("start_updates"),
        MethodDescriptor::required_instance("stop_updates"),
        MethodDescriptor::required_instance("authorization_status"),
        MethodDescriptor::optional_instance("request_authorization"),
        MethodDescriptor::optional_instance("set_desired_accuracy"),
    ],
};

/// Methods of [`crate::Geocoder`].
pub const GEOCODER_PROTOCOL: ProtocolDescriptor = ProtocolDescriptor {
    name: "Geocoder",
    methods: &[MethodDescriptor::required_instance("reverse_geocode")],
};

/// Every descriptor the crate ships, for lookup by name.
pub const PROTOCOLS: &[ProtocolDescriptor] = &[
    LOCATION_OBSERVER_PROTOCOL,
    LOCATION_PROVIDER_PROTOCOL,
    GEOCODER_PROTOCOL,
];

/// Find a shipped descriptor by name (case-insensitive).
pub fn protocol_named(name: &str) -> Option<&'static ProtocolDescriptor> {
    PROTOCOLS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Whether `selector` is declared by `protocol` with exactly the given
/// required/optional and instance/static combination.
pub fn selector_is_in_list_of_protocol_methods_with_props(
    selector: &str,
    protocol: &ProtocolDescriptor,
    is_required: bool,
    is_instance: bool,
) -> bool {
    protocol
        .methods
        .iter()
        .any(|m| m.selector == selector && m.required == is_required && m.instance == is_instance)
}

/// Whether `selector` is declared by `protocol` under any combination.
pub fn selector_conforms_to_protocol(selector: &str, protocol: &ProtocolDescriptor) -> bool {
    [(true, true), (true, false), (false, true), (false, false)]
        .into_iter()
        .any(|(required, instance)| {
            selector_is_in_list_of_protocol_methods_with_props(selector, protocol, required, instance)
        })
}
