//! Slot identities of the master data and master command tables.
//!
//! The discriminant of each variant is its ordinal in the firmware's master list.

use core::fmt;

macro_rules! slot_ids {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $label:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            /// Every slot, in master-list order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// Ordinal of this slot in the master list.
            pub const fn index(self) -> usize {
                self as usize
            }

            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            /// Firmware name of the slot.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

slot_ids! {
    /// A slot of the Master Data Table.
    pub enum DataTableId {
        UtilityPipeLine => "UtilityPipeLine",
        MultimediaCapabilityInfo => "MultimediaCapabilityInfo",
        MultimediaConfigInfo => "MultimediaConfigInfo",
        StandardVesaTiming => "StandardVESA_Timing",
        FirmwareInfo => "FirmwareInfo",
        DacInfo => "DAC_Info",
        LvdsInfo => "LVDS_Info",
        TmdsInfo => "TMDS_Info",
        AnalogTvInfo => "AnalogTV_Info",
        SupportedDevicesInfo => "SupportedDevicesInfo",
        GpioI2cInfo => "GPIO_I2C_Info",
        VramUsageByFirmware => "VRAM_UsageByFirmware",
        GpioPinLut => "GPIO_Pin_LUT",
        VesaToInternalModeLut => "VESA_ToInternalModeLUT",
        ComponentVideoInfo => "ComponentVideoInfo",
        PowerPlayInfo => "PowerPlayInfo",
        CompassionateData => "CompassionateData",
        SaveRestoreInfo => "SaveRestoreInfo",
        PpllSsInfo => "PPLL_SS_Info",
        OemInfo => "OemInfo",
        XtmdsInfo => "XTMDS_Info",
        MclkSsInfo => "MclkSS_Info",
        ObjectHeader => "Object_Header",
        IndirectIoAccess => "IndirectIOAccess",
        McInitParameter => "MC_InitParameter",
        AsicVddcInfo => "ASIC_VDDC_Info",
        AsicInternalSsInfo => "ASIC_InternalSS_Info",
        TvVideoMode => "TV_VideoMode",
        VramInfo => "VRAM_Info",
        MemoryTrainingInfo => "MemoryTrainingInfo",
        IntegratedSystemInfo => "IntegratedSystemInfo",
        AsicProfilingInfo => "ASIC_ProfilingInfo",
        VoltageObjectInfo => "VoltageObjectInfo",
        PowerSourceInfo => "PowerSourceInfo",
    }
}

slot_ids! {
    /// A slot of the Master Command Table.
    pub enum CommandId {
        AsicInit => "ASIC_Init",
        GetDisplaySurfaceSize => "GetDisplaySurfaceSize",
        AsicRegistersInit => "ASIC_RegistersInit",
        VramBlockVenderDetection => "VRAM_BlockVenderDetection",
        DigxEncoderControl => "DIGxEncoderControl",
        MemoryControllerInit => "MemoryControllerInit",
        EnableCrtcMemReq => "EnableCRTCMemReq",
        MemoryParamAdjust => "MemoryParamAdjust",
        DvoEncoderControl => "DVOEncoderControl",
        GpioPinControl => "GPIOPinControl",
        SetEngineClock => "SetEngineClock",
        SetMemoryClock => "SetMemoryClock",
        SetPixelClock => "SetPixelClock",
        DynamicClockGating => "DynamicClockGating",
        ResetMemoryDll => "ResetMemoryDLL",
        ResetMemoryDevice => "ResetMemoryDevice",
        MemoryPllInit => "MemoryPLLInit",
        AdjustDisplayPll => "AdjustDisplayPll",
        AdjustMemoryController => "AdjustMemoryController",
        EnableAsicStaticPwrMgt => "EnableASIC_StaticPwrMgt",
        AsicStaticPwrMgtStatusChange => "ASIC_StaticPwrMgtStatusChange",
        DacLoadDetection => "DAC_LoadDetection",
        LvtmaEncoderControl => "LVTMAEncoderControl",
        Lcd1OutputControl => "LCD1OutputControl",
        Dac1EncoderControl => "DAC1EncoderControl",
        Dac2EncoderControl => "DAC2EncoderControl",
        DvoOutputControl => "DVOOutputControl",
        Cv1OutputControl => "CV1OutputControl",
        GetConditionalGoldenSetting => "GetConditionalGoldenSetting",
        TvEncoderControl => "TVEncoderControl",
        TmdsaEncoderControl => "TMDSAEncoderControl",
        LvdsEncoderControl => "LVDSEncoderControl",
        Tv1OutputControl => "TV1OutputControl",
        EnableScaler => "EnableScaler",
        BlankCrtc => "BlankCRTC",
        EnableCrtc => "EnableCRTC",
        GetPixelClock => "GetPixelClock",
        EnableVgaRender => "EnableVGA_Render",
        EnableVgaAccess => "EnableVGA_Access",
        SetCrtcTiming => "SetCRTC_Timing",
        SetCrtcOverScan => "SetCRTC_OverScan",
        SetCrtcReplication => "SetCRTC_Replication",
        SelectCrtcSource => "SelectCRTC_Source",
        EnableGraphSurfaces => "EnableGraphSurfaces",
        UpdateCrtcDoubleBufferRegisters => "UpdateCRTC_DoubleBufferRegisters",
        LutAutoFill => "LUT_AutoFill",
        EnableHwIconCursor => "EnableHW_IconCursor",
        GetMemoryClock => "GetMemoryClock",
        GetEngineClock => "GetEngineClock",
        SetCrtcUsingDtdTiming => "SetCRTC_UsingDTDTiming",
        ExternalEncoderControl => "ExternalEncoderControl",
        LvtmaOutputControl => "LVTMAOutputControl",
        VramBlockDetectionByStrap => "VRAM_BlockDetectionByStrap",
        MemoryCleanUp => "MemoryCleanUp",
        ProcessI2cChannelTransaction => "ProcessI2cChannelTransaction",
        WriteOneByteToHwAssistedI2c => "WriteOneByteToHWAssistedI2C",
        ReadHwAssistedI2cStatus => "ReadHWAssistedI2CStatus",
        SpeedFanControl => "SpeedFanControl",
        PowerConnectorDetection => "PowerConnectorDetection",
        McSynchronization => "MC_Synchronization",
        ComputeMemoryEnginePll => "ComputeMemoryEnginePLL",
        MemoryRefreshConversion => "MemoryRefreshConversion",
        VramGetCurrentInfoBlock => "VRAM_GetCurrentInfoBlock",
        DynamicMemorySettings => "DynamicMemorySettings",
        MemoryTraining => "MemoryTraining",
        EnableSpreadSpectrumOnPpll => "EnableSpreadSpectrumOnPPLL",
        TmdsaOutputControl => "TMDSAOutputControl",
        SetVoltage => "SetVoltage",
        Dac1OutputControl => "DAC1OutputControl",
        Dac2OutputControl => "DAC2OutputControl",
        SetupHwAssistedI2cStatus => "SetupHWAssistedI2CStatus",
        ClockSource => "ClockSource",
        MemoryDeviceInit => "MemoryDeviceInit",
        EnableYuv => "EnableYUV",
        Dig1EncoderControl => "DIG1EncoderControl",
        Dig2EncoderControl => "DIG2EncoderControl",
        Dig1TransmitterControl => "DIG1TransmitterControl",
        Dig2TransmitterControl => "DIG2TransmitterControl",
        ProcessAuxChannelTransaction => "ProcessAuxChannelTransaction",
        DpEncoderService => "DPEncoderService",
    }
}
