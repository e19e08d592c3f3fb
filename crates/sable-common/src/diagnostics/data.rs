//! Diagnostic codes and message templates.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const CANNOT_FIND_TYPE_IN_SCOPE: u32 = 2001;
    pub const NOT_A_TYPE: u32 = 2002;
    pub const CANNOT_FIND_IN_SCOPE: u32 = 2003;
    pub const NO_SUCH_MODULE: u32 = 2004;
    pub const EXTENSION_METATYPE: u32 = 2101;
    pub const EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC: u32 = 2102;
    pub const EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC_TYPE: u32 = 2103;
    pub const EXTENDED_TYPE_HERE: u32 = 2104;
    pub const EXTENSION_GENERIC_WRONG_NUMBER_OF_PARAMETERS: u32 = 2105;
    pub const NON_NOMINAL_EXTENSION: u32 = 2106;
    pub const MISSING_CAPABILITY: u32 = 2201;
    pub const BOOL_TYPE_BROKEN: u32 = 2202;
    pub const BRIDGED_DECL_USED_WITHOUT_REQUIRED_MODULE: u32 = 2301;
    pub const CHECKING_DID_NOT_CONVERGE: u32 = 2901;
}

pub mod diagnostic_messages {
    pub const CANNOT_FIND_TYPE_IN_SCOPE: &str = "Cannot find type '{0}' in scope.";
    pub const NOT_A_TYPE: &str = "'{0}' is not a type.";
    pub const CANNOT_FIND_IN_SCOPE: &str = "Cannot find '{0}' in scope.";
    pub const NO_SUCH_MODULE: &str = "No such module '{0}'.";
    pub const EXTENSION_METATYPE: &str =
        "Cannot extend a metatype '{0}.Type'; extensions apply to nominal types.";
    pub const EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC: &str =
        "'{0}' does not refer to a type declaration; generic parameters are not allowed here.";
    pub const EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC_TYPE: &str =
        "Cannot extend non-generic type '{0}' with generic parameters.";
    pub const EXTENDED_TYPE_HERE: &str = "Extended type '{0}' declared here.";
    pub const EXTENSION_GENERIC_WRONG_NUMBER_OF_PARAMETERS: &str =
        "Extension of generic type '{0}' has too {1} generic parameters (have {2}, expected {3}).";
    pub const NON_NOMINAL_EXTENSION: &str = "Non-nominal type '{0}' cannot be extended.";
    pub const MISSING_CAPABILITY: &str = "Missing capability '{0}'.";
    pub const BOOL_TYPE_BROKEN: &str = "Broken standard library: cannot find type 'Bool'.";
    pub const BRIDGED_DECL_USED_WITHOUT_REQUIRED_MODULE: &str =
        "'@{0}' attribute used without importing module '{1}'.";
    pub const CHECKING_DID_NOT_CONVERGE: &str =
        "Type checking did not converge after {0} rounds.";
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_FIND_TYPE_IN_SCOPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CANNOT_FIND_TYPE_IN_SCOPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::NOT_A_TYPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::NOT_A_TYPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_FIND_IN_SCOPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CANNOT_FIND_IN_SCOPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::NO_SUCH_MODULE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::NO_SUCH_MODULE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::EXTENSION_METATYPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::EXTENSION_METATYPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC,
    },
    DiagnosticMessage {
        code: diagnostic_codes::EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC_TYPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC_TYPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::EXTENDED_TYPE_HERE,
        category: DiagnosticCategory::Message,
        message: diagnostic_messages::EXTENDED_TYPE_HERE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::EXTENSION_GENERIC_WRONG_NUMBER_OF_PARAMETERS,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::EXTENSION_GENERIC_WRONG_NUMBER_OF_PARAMETERS,
    },
    DiagnosticMessage {
        code: diagnostic_codes::NON_NOMINAL_EXTENSION,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::NON_NOMINAL_EXTENSION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::MISSING_CAPABILITY,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::MISSING_CAPABILITY,
    },
    DiagnosticMessage {
        code: diagnostic_codes::BOOL_TYPE_BROKEN,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::BOOL_TYPE_BROKEN,
    },
    DiagnosticMessage {
        code: diagnostic_codes::BRIDGED_DECL_USED_WITHOUT_REQUIRED_MODULE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::BRIDGED_DECL_USED_WITHOUT_REQUIRED_MODULE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CHECKING_DID_NOT_CONVERGE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CHECKING_DID_NOT_CONVERGE,
    },
];
