//! Static service catalog shown on the public site.

use keystone_common::ServiceOffering;

static SERVICES: &[ServiceOffering] = &[
    ServiceOffering {
        slug: "plc-programming",
        title: "PLC Programming",
        summary: "Design, programming and commissioning of PLC control logic for new and existing lines.",
        capabilities: &[
            "Siemens, Allen-Bradley, Mitsubishi and Delta platforms",
            "IEC 61131-3 ladder, structured text and function blocks",
            "Legacy code migration and documentation",
        ],
    },
    ServiceOffering {
        slug: "scada-hmi",
        title: "SCADA & HMI Systems",
        summary: "Operator interfaces and plant-wide supervisory control with alarm and trend management.",
        capabilities: &[
            "HMI screen design and alarm rationalisation",
            "Historian and reporting integration",
            "Remote monitoring over secure VPN",
        ],
    },
    ServiceOffering {
        slug: "control-panels",
        title: "Control Panel Manufacturing",
        summary: "Build and wiring of MCC, PCC and automation panels tested before dispatch.",
        capabilities: &[
            "Panel design to IEC 61439",
            "Factory acceptance testing",
            "On-site installation and loop checks",
        ],
    },
    ServiceOffering {
        slug: "drives-motion",
        title: "Drives & Motion Control",
        summary: "VFD and servo selection, tuning and integration for conveyors, pumps and packaging.",
        capabilities: &[
            "Energy audits and VFD retrofits",
            "Multi-axis servo synchronisation",
            "Fieldbus integration (PROFINET, EtherNet/IP, Modbus)",
        ],
    },
    ServiceOffering {
        slug: "iiot-analytics",
        title: "Industrial IoT & Analytics",
        summary: "Connect machines to dashboards for OEE, energy and predictive maintenance insight.",
        capabilities: &[
            "Edge gateways and MQTT/OPC UA connectivity",
            "OEE and downtime dashboards",
            "Condition monitoring and alerts",
        ],
    },
    ServiceOffering {
        slug: "maintenance-support",
        title: "Maintenance & Support",
        summary: "Annual maintenance contracts, breakdown support and spares for automation assets.",
        capabilities: &[
            "Preventive maintenance schedules",
            "Remote diagnostics",
            "Critical spares management",
        ],
    },
];

/// All services, in display order
pub fn all() -> &'static [ServiceOffering] {
    SERVICES
}

/// Look up a service by slug
pub fn find(slug: &str) -> Option<&'static ServiceOffering> {
    SERVICES.iter().find(|service| service.slug == slug)
}
